//! Full producer/consumer scenarios: a client thread issuing calls, a server
//! thread dispatching them into a recording driver.

mod common;

use common::RecordingDriver;
use glink_client::GlesClient;
use glink_protocol::{glenum, ContextId, DisplayId, Namespace, SurfaceId};
use glink_ring::{transport_pair, TransportConfig};
use glink_server::Dispatcher;
use glink_state::NamePools;
use pretty_assertions::assert_eq;
use std::thread::JoinHandle;

const DPY: DisplayId = DisplayId(0x10);
const CTX_A: ContextId = ContextId(0xA);
const DRAW: SurfaceId = SurfaceId(0xD1);
const READ: SurfaceId = SurfaceId(0xD2);

struct Session {
    client: GlesClient,
    driver: RecordingDriver,
    server: JoinHandle<Dispatcher<RecordingDriver>>,
}

fn start() -> Session {
    start_with(TransportConfig::default())
}

fn start_with(config: TransportConfig) -> Session {
    let (producer, consumer) = transport_pair(&config);
    let driver = RecordingDriver::new();
    let mut dispatcher = Dispatcher::new(consumer, driver.clone());
    let server = std::thread::spawn(move || {
        dispatcher.run().expect("dispatcher failed");
        dispatcher
    });
    Session {
        client: GlesClient::new(producer, NamePools::shared()),
        driver,
        server,
    }
}

impl Session {
    /// Disconnect the client and wait for the server to drain everything.
    fn shutdown(self) -> (RecordingDriver, Dispatcher<RecordingDriver>) {
        self.client.disconnect();
        let dispatcher = self.server.join().expect("server thread panicked");
        (self.driver, dispatcher)
    }
}

#[test]
fn no_active_context_produces_no_records() {
    // Without a current context, calls never reach the wire.
    let mut session = start();
    session.client.bind_buffer(glenum::ARRAY_BUFFER, 1);
    session.client.bind_buffer(glenum::ARRAY_BUFFER, 2);
    assert_eq!(session.client.get_error(), glenum::INVALID_OPERATION);

    let (driver, _) = session.shutdown();
    assert_eq!(driver.log(), Vec::<String>::new());
}

#[test]
fn redundant_state_setters_reach_the_driver_once() {
    // Two identical ClearColor calls, one record on the wire.
    let mut session = start();
    assert!(session.client.make_current(DPY, DRAW, READ, CTX_A));
    session.client.clear_color(1.0, 0.0, 0.0, 1.0);
    session.client.clear_color(1.0, 0.0, 0.0, 1.0);
    session.client.finish();

    assert_eq!(session.driver.count("clear_color"), 1);

    // A different value goes through again.
    session.client.clear_color(0.0, 1.0, 0.0, 1.0);
    session.client.finish();
    assert_eq!(session.driver.count("clear_color"), 2);
    session.shutdown();
}

#[test]
fn capability_toggles_are_elided_against_defaults() {
    let mut session = start();
    assert!(session.client.make_current(DPY, DRAW, READ, CTX_A));

    session.client.disable(glenum::BLEND); // default state, elided
    session.client.enable(glenum::BLEND);
    session.client.enable(glenum::BLEND); // redundant
    session.client.finish();

    assert_eq!(session.driver.count("set_capability"), 1);
    session.shutdown();
}

#[test]
fn destroyed_context_lives_until_deactivated() {
    // DestroyContext while current defers the free to the next
    // MakeCurrent(none), on both sides of the transport.
    let mut session = start();
    assert!(session.client.make_current(DPY, DRAW, READ, CTX_A));
    assert!(session.client.destroy_context(DPY, CTX_A));
    assert_eq!(session.client.tracked_contexts(), 1);

    assert!(session.client.make_current(
        DisplayId::NONE,
        SurfaceId::NONE,
        SurfaceId::NONE,
        ContextId::NONE,
    ));
    assert_eq!(session.client.tracked_contexts(), 0);

    let (_, dispatcher) = session.shutdown();
    assert_eq!(dispatcher.tracked_contexts(), 0);
}

#[test]
fn deleted_names_are_reused_and_remapped() {
    // The virtual name comes back from the free list, but binds after
    // re-generation resolve to a fresh real name.
    let mut session = start();
    assert!(session.client.make_current(DPY, DRAW, READ, CTX_A));

    let first = session.client.gen_buffers(1);
    assert_eq!(first, vec![1]);
    session.client.bind_buffer(glenum::ARRAY_BUFFER, first[0]);
    session.client.delete_buffers(&first);

    let second = session.client.gen_buffers(1);
    assert_eq!(second, first, "deleted name is reused");
    session.client.bind_buffer(glenum::ARRAY_BUFFER, second[0]);
    session.client.finish();

    let (driver, dispatcher) = session.shutdown();
    let bound = driver.bound_buffers();
    assert_eq!(bound.len(), 2);
    assert_ne!(bound[0], bound[1], "rebind resolves to a fresh real name");
    assert_eq!(
        dispatcher.resolve_name(Namespace::Buffer, second[0]),
        Some(bound[1])
    );
}

#[test]
fn finish_subsumes_all_earlier_async_records() {
    let mut session = start();
    assert!(session.client.make_current(DPY, DRAW, READ, CTX_A));

    for i in 0..32 {
        session.client.draw_arrays(glenum::TRIANGLES, 0, 3 + i);
    }
    session.client.finish();

    // `finish` returned, so every earlier async record has executed.
    assert_eq!(session.driver.count("draw_arrays"), 32);
    assert_eq!(session.driver.count("finish"), 1);
    session.shutdown();
}

#[test]
fn local_validation_errors_never_reach_the_driver() {
    let mut session = start();
    assert!(session.client.make_current(DPY, DRAW, READ, CTX_A));

    session.client.enable(0xBEEF);
    assert_eq!(session.client.get_error(), glenum::INVALID_ENUM);
    assert_eq!(session.client.get_error(), glenum::NO_ERROR);

    // Sticky slot: the first error wins until queried.
    session.client.enable(0xBEEF);
    session.client.line_width(-1.0);
    assert_eq!(session.client.get_error(), glenum::INVALID_ENUM);

    let (driver, _) = session.shutdown();
    assert_eq!(driver.count("set_capability"), 0);
    assert_eq!(driver.count("get_error"), 0, "answered locally");
}

#[test]
fn deferred_errors_forward_exactly_one_driver_query() {
    let mut session = start();
    assert!(session.client.make_current(DPY, DRAW, READ, CTX_A));

    session.driver.push_error(glenum::INVALID_OPERATION);
    session.client.bind_texture(glenum::TEXTURE_2D, 5);
    assert_eq!(session.client.get_error(), glenum::INVALID_OPERATION);
    assert_eq!(session.driver.count("get_error"), 1);

    // The flag is cleared: the next query is answered locally again.
    assert_eq!(session.client.get_error(), glenum::NO_ERROR);
    assert_eq!(session.driver.count("get_error"), 1);
    session.shutdown();
}

#[test]
fn integer_queries_prefer_the_mirror() {
    let mut session = start();
    assert!(session.client.make_current(DPY, DRAW, READ, CTX_A));

    session.client.viewport(0, 0, 640, 480);
    assert_eq!(
        session.client.get_integerv(glenum::VIEWPORT),
        vec![0, 0, 640, 480]
    );
    assert_eq!(session.driver.count("get_integerv"), 0);

    // Implementation limits round-trip once, then come from the cache.
    assert_eq!(
        session.client.get_integerv(glenum::MAX_TEXTURE_SIZE),
        vec![4096]
    );
    assert_eq!(
        session.client.get_integerv(glenum::MAX_TEXTURE_SIZE),
        vec![4096]
    );
    assert_eq!(session.driver.count("get_integerv"), 1);
    session.shutdown();
}

#[test]
fn object_creation_queries_return_driver_ids() {
    let mut session = start();
    assert!(session.client.make_current(DPY, DRAW, READ, CTX_A));

    let shader = session.client.create_shader(glenum::VERTEX_SHADER);
    assert_ne!(shader, 0);
    let program = session.client.create_program();
    assert_ne!(program, 0);
    assert_ne!(shader, program);

    session.client.shader_source(shader, "void main() {}");
    session.client.compile_shader(shader);
    session.client.attach_shader(program, shader);
    session.client.link_program(program);
    session.client.finish();

    let (driver, _) = session.shutdown();
    assert_eq!(driver.count("shader_source"), 1);
    assert_eq!(driver.count("link_program"), 1);

    // Invalid shader kind fails locally.
    // (Checked before shutdown in a fresh session to keep ordering simple.)
    let mut session = start();
    assert!(session.client.make_current(DPY, DRAW, READ, CTX_A));
    assert_eq!(session.client.create_shader(0xBEEF), 0);
    assert_eq!(session.client.get_error(), glenum::INVALID_ENUM);
    let (driver, _) = session.shutdown();
    assert_eq!(driver.count("create_shader"), 0);
}

#[test]
fn texture_uploads_are_sized_by_the_unpack_alignment() {
    let mut session = start();
    assert!(session.client.make_current(DPY, DRAW, READ, CTX_A));

    let pixels = vec![0xAAu8; 64];

    // A caller buffer smaller than the computed size drops the call.
    session.client.tex_image_2d(
        glenum::TEXTURE_2D,
        0,
        glenum::RGB,
        64,
        64,
        0,
        glenum::RGB,
        glenum::UNSIGNED_BYTE,
        Some(&pixels),
    );
    assert_eq!(session.client.get_error(), glenum::INVALID_VALUE);
    session.client.finish();
    assert_eq!(session.driver.count("tex_image_2d"), 0);

    // 3x3 RGB under default alignment 4: rows pad to 12 bytes, 33 total.
    session.client.tex_image_2d(
        glenum::TEXTURE_2D,
        0,
        glenum::RGB,
        3,
        3,
        0,
        glenum::RGB,
        glenum::UNSIGNED_BYTE,
        Some(&pixels),
    );
    session.client.finish();
    assert_eq!(session.driver.count("tex_image_2d"), 1);
    assert!(session
        .driver
        .log()
        .iter()
        .any(|e| e.starts_with("tex_image_2d") && e.contains("Some(33)")));
    session.shutdown();
}

#[test]
fn oversized_uploads_fail_with_out_of_memory() {
    // A payload that cannot be guaranteed to fit on the ring drops the call
    // with a sticky OUT_OF_MEMORY instead of spinning on a reserve that may
    // never succeed.
    let mut session = start_with(TransportConfig {
        capacity_bytes: 256,
        sync_wait_timeout: None,
    });
    assert!(session.client.make_current(DPY, DRAW, READ, CTX_A));

    session
        .client
        .buffer_data(glenum::ARRAY_BUFFER, &[0u8; 4096], glenum::STATIC_DRAW);
    assert_eq!(session.client.get_error(), glenum::OUT_OF_MEMORY);

    let (driver, _) = session.shutdown();
    assert_eq!(driver.count("buffer_data"), 0);
    assert_eq!(driver.count("get_error"), 0, "answered locally");
}

#[test]
fn gen_without_context_mints_nothing() {
    let mut session = start();
    assert!(session.client.gen_buffers(2).is_empty());

    // After binding a context the same pool starts from scratch.
    assert!(session.client.make_current(DPY, DRAW, READ, CTX_A));
    assert_eq!(session.client.gen_buffers(2), vec![1, 2]);
    session.shutdown();
}
