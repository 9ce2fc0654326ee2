//! Context/display/surface lifecycle state machine.
//!
//! Several teardown entry points can legally target the context a thread is
//! still using; freeing its record at that moment would pull state out from
//! under in-flight calls. The registry therefore only flags such records and
//! defers the actual free to the next deactivation, where [`sweep`] runs as
//! an explicit, testable operation.
//!
//! Records live in an arena of stable slots; both the issuing and executing
//! side keep one registry, parameterized over the per-context payload (the
//! full state mirror on the issuing side, nothing on the executing side).
//!
//! [`sweep`]: ContextRegistry::sweep

use bitflags::bitflags;
use glink_protocol::{ContextId, DisplayId, SurfaceId};
use tracing::debug;

bitflags! {
    /// Deferred-destroy requests accumulated while a record was active.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DestroyFlags: u8 {
        const DISPLAY = 1 << 0;
        const CONTEXT = 1 << 1;
        const DRAW = 1 << 2;
        const READ = 1 << 3;
    }
}

/// Stable handle to a context record within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotId(usize);

#[derive(Debug)]
pub struct ContextRecord<S> {
    pub display: DisplayId,
    pub context: ContextId,
    pub draw: SurfaceId,
    pub read: SurfaceId,
    pub active: bool,
    pub pending: DestroyFlags,
    pub state: S,
}

impl<S: Default> ContextRecord<S> {
    fn new(display: DisplayId, context: ContextId) -> Self {
        Self {
            display,
            context,
            draw: SurfaceId::NONE,
            read: SurfaceId::NONE,
            active: false,
            pending: DestroyFlags::empty(),
            state: S::default(),
        }
    }
}

pub struct ContextRegistry<S> {
    slots: Vec<Option<ContextRecord<S>>>,
    free: Vec<usize>,
    active: Option<SlotId>,
}

impl<S: Default> ContextRegistry<S> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            active: None,
        }
    }

    /// Number of live (tracked) context records, active or not.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn active_slot(&self) -> Option<SlotId> {
        self.active
    }

    pub fn active(&self) -> Option<&ContextRecord<S>> {
        self.get(self.active?)
    }

    pub fn active_mut(&mut self) -> Option<&mut ContextRecord<S>> {
        let slot = self.active?;
        self.get_mut(slot)
    }

    pub fn get(&self, slot: SlotId) -> Option<&ContextRecord<S>> {
        self.slots.get(slot.0)?.as_ref()
    }

    pub fn get_mut(&mut self, slot: SlotId) -> Option<&mut ContextRecord<S>> {
        self.slots.get_mut(slot.0)?.as_mut()
    }

    pub fn find(&self, display: DisplayId, context: ContextId) -> Option<SlotId> {
        self.slots.iter().position(|s| {
            s.as_ref()
                .map_or(false, |r| r.display == display && r.context == context)
        })
        .map(SlotId)
    }

    /// Bind `(display, context)` as the current record, creating it on first
    /// use. Returns `None` when binding "no context".
    pub fn make_current(
        &mut self,
        display: DisplayId,
        draw: SurfaceId,
        read: SurfaceId,
        context: ContextId,
    ) -> Option<SlotId> {
        if display == DisplayId::NONE || context == ContextId::NONE {
            self.release();
            return None;
        }

        self.deactivate_current();

        let slot = match self.find(display, context) {
            Some(slot) => slot,
            None => self.insert(ContextRecord::new(display, context)),
        };
        if let Some(record) = self.get_mut(slot) {
            record.active = true;
            record.draw = draw;
            record.read = read;
        }
        self.active = Some(slot);
        slot_trace("activated", slot);
        Some(slot)
    }

    /// Unbind the current record, if any. Equivalent to binding "no context";
    /// also the behavior of `ReleaseThread`.
    pub fn release(&mut self) {
        self.deactivate_current();
    }

    /// Flag every record of `(display, context)` for destruction; records
    /// not currently active are freed immediately.
    pub fn destroy_context(&mut self, display: DisplayId, context: ContextId) {
        for i in 0..self.slots.len() {
            let slot = SlotId(i);
            let matches = self
                .get(slot)
                .map_or(false, |r| r.display == display && r.context == context);
            if matches {
                if let Some(record) = self.get_mut(slot) {
                    record.pending |= DestroyFlags::CONTEXT;
                }
                self.sweep(slot);
            }
        }
    }

    /// Flag or clear `surface` on every record of `display`. Inactive
    /// records drop the handle immediately; active ones keep a pending flag
    /// for the next deactivation.
    pub fn destroy_surface(&mut self, display: DisplayId, surface: SurfaceId) {
        for i in 0..self.slots.len() {
            let Some(record) = self.get_mut(SlotId(i)) else {
                continue;
            };
            if record.display != display {
                continue;
            }
            if record.active {
                if record.draw == surface {
                    record.pending |= DestroyFlags::DRAW;
                }
                if record.read == surface {
                    record.pending |= DestroyFlags::READ;
                }
            } else {
                if record.draw == surface {
                    record.draw = SurfaceId::NONE;
                }
                if record.read == surface {
                    record.read = SurfaceId::NONE;
                }
            }
        }
    }

    /// Free every inactive record of `display` now; flag the active one (if
    /// it belongs to `display`) for deferred destruction.
    pub fn terminate(&mut self, display: DisplayId) {
        for i in 0..self.slots.len() {
            let slot = SlotId(i);
            let Some(record) = self.get_mut(slot) else {
                continue;
            };
            if record.display != display {
                continue;
            }
            if record.active {
                record.pending |= DestroyFlags::DISPLAY;
            } else {
                self.remove(slot);
            }
        }
    }

    /// Free `slot` if it is inactive with any pending-destroy flag set. The
    /// record's payload (including any heap-grown attribute storage) is
    /// dropped with it.
    pub fn sweep(&mut self, slot: SlotId) {
        let collectable = self
            .get(slot)
            .map_or(false, |r| !r.active && !r.pending.is_empty());
        if collectable {
            self.remove(slot);
        }
    }

    fn deactivate_current(&mut self) {
        if let Some(slot) = self.active.take() {
            if let Some(record) = self.get_mut(slot) {
                record.active = false;
            }
            slot_trace("deactivated", slot);
            self.sweep(slot);
        }
    }

    fn insert(&mut self, record: ContextRecord<S>) -> SlotId {
        match self.free.pop() {
            Some(i) => {
                self.slots[i] = Some(record);
                SlotId(i)
            }
            None => {
                self.slots.push(Some(record));
                SlotId(self.slots.len() - 1)
            }
        }
    }

    fn remove(&mut self, slot: SlotId) {
        if let Some(entry) = self.slots.get_mut(slot.0) {
            if entry.take().is_some() {
                self.free.push(slot.0);
                if self.active == Some(slot) {
                    self.active = None;
                }
                slot_trace("removed", slot);
            }
        }
    }
}

impl<S: Default> Default for ContextRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

fn slot_trace(what: &str, slot: SlotId) {
    debug!(slot = slot.0, "context record {what}");
}
