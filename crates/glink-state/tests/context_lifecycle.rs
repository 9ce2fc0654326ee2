use glink_protocol::{ContextId, DisplayId, SurfaceId};
use glink_state::{ContextRegistry, DestroyFlags};

const DPY: DisplayId = DisplayId(0x10);
const DPY_B: DisplayId = DisplayId(0x20);
const CTX_A: ContextId = ContextId(0xA);
const CTX_B: ContextId = ContextId(0xB);
const DRAW: SurfaceId = SurfaceId(0xD1);
const READ: SurfaceId = SurfaceId(0xD2);

fn registry() -> ContextRegistry<()> {
    ContextRegistry::new()
}

#[test]
fn records_are_created_lazily_on_first_bind() {
    let mut reg = registry();
    assert!(reg.is_empty());

    let slot = reg.make_current(DPY, DRAW, READ, CTX_A).unwrap();
    assert_eq!(reg.len(), 1);
    let record = reg.get(slot).unwrap();
    assert!(record.active);
    assert_eq!(record.draw, DRAW);
    assert_eq!(record.read, READ);

    // Rebinding the same key reuses the record with fresh surfaces.
    let slot2 = reg.make_current(DPY, READ, READ, CTX_A).unwrap();
    assert_eq!(reg.len(), 1);
    assert_eq!(reg.get(slot2).unwrap().draw, READ);
}

#[test]
fn context_destroyed_while_active_survives_until_deactivation() {
    // DestroyContext(ctxA) while ctxA is current, then MakeCurrent(none)
    // finally frees the record.
    let mut reg = registry();
    reg.make_current(DPY, DRAW, READ, CTX_A);

    reg.destroy_context(DPY, CTX_A);
    assert_eq!(reg.len(), 1, "active record must not be freed yet");
    assert!(reg
        .active()
        .is_some_and(|r| r.pending.contains(DestroyFlags::CONTEXT)));

    reg.make_current(DPY, SurfaceId::NONE, SurfaceId::NONE, ContextId::NONE);
    assert!(reg.is_empty(), "deactivation sweeps the flagged record");
}

#[test]
fn context_destroyed_while_inactive_is_freed_immediately() {
    let mut reg = registry();
    reg.make_current(DPY, DRAW, READ, CTX_A);
    reg.make_current(DPY, DRAW, READ, CTX_B); // ctxA becomes inactive
    assert_eq!(reg.len(), 2);

    reg.destroy_context(DPY, CTX_A);
    assert_eq!(reg.len(), 1);
    assert!(reg.find(DPY, CTX_A).is_none());
    assert!(reg.find(DPY, CTX_B).is_some());
}

#[test]
fn switching_contexts_sweeps_the_flagged_previous_record() {
    let mut reg = registry();
    reg.make_current(DPY, DRAW, READ, CTX_A);
    reg.destroy_context(DPY, CTX_A);

    // Switching to another context deactivates ctxA and sweeps it.
    reg.make_current(DPY, DRAW, READ, CTX_B);
    assert_eq!(reg.len(), 1);
    assert!(reg.find(DPY, CTX_A).is_none());
}

#[test]
fn release_thread_behaves_like_unbinding() {
    let mut reg = registry();
    reg.make_current(DPY, DRAW, READ, CTX_A);
    reg.destroy_context(DPY, CTX_A);

    reg.release();
    assert!(reg.is_empty());
    assert!(reg.active_slot().is_none());
}

#[test]
fn destroy_surface_clears_inactive_records_and_flags_active_ones() {
    let mut reg = registry();
    reg.make_current(DPY, DRAW, READ, CTX_A);
    reg.make_current(DPY, DRAW, READ, CTX_B); // ctxA inactive, same surfaces

    reg.destroy_surface(DPY, DRAW);

    // Inactive record: handle dropped immediately, record survives.
    let inactive = reg.get(reg.find(DPY, CTX_A).unwrap()).unwrap();
    assert_eq!(inactive.draw, SurfaceId::NONE);
    assert_eq!(inactive.read, READ);
    assert!(inactive.pending.is_empty());

    // Active record: only flagged; freed on deactivation.
    let active = reg.active().unwrap();
    assert_eq!(active.draw, DRAW);
    assert!(active.pending.contains(DestroyFlags::DRAW));

    reg.release();
    assert!(reg.find(DPY, CTX_B).is_none());
}

#[test]
fn terminate_frees_inactive_records_of_the_display_only() {
    let mut reg = registry();
    reg.make_current(DPY, DRAW, READ, CTX_A);
    reg.make_current(DPY_B, DRAW, READ, CTX_B); // ctxA inactive on DPY

    reg.terminate(DPY);
    assert!(reg.find(DPY, CTX_A).is_none());
    assert!(reg.find(DPY_B, CTX_B).is_some(), "other display untouched");

    // Terminating the active record's display defers the free.
    reg.terminate(DPY_B);
    assert_eq!(reg.len(), 1);
    assert!(reg
        .active()
        .is_some_and(|r| r.pending.contains(DestroyFlags::DISPLAY)));
    reg.release();
    assert!(reg.is_empty());
}

#[test]
fn slots_are_reused_after_removal() {
    let mut reg = registry();
    let first = reg.make_current(DPY, DRAW, READ, CTX_A).unwrap();
    reg.destroy_context(DPY, CTX_A);
    reg.release();

    let second = reg.make_current(DPY, DRAW, READ, CTX_B).unwrap();
    assert_eq!(first, second, "arena reuses freed slots");
    assert_eq!(reg.len(), 1);
}
