use glink_client::GlesClient;
use glink_protocol::glenum;
use glink_ring::{transport_pair, TransportConfig};
use glink_state::NamePools;

#[test]
fn calls_without_a_context_never_reach_the_wire() {
    let (producer, consumer) = transport_pair(&TransportConfig::default());
    let mut client = GlesClient::new(producer, NamePools::shared());

    client.bind_buffer(glenum::ARRAY_BUFFER, 1);
    client.bind_buffer(glenum::ARRAY_BUFFER, 2);
    client.clear_color(0.0, 0.0, 0.0, 1.0);
    client.enable(glenum::BLEND);
    client.delete_buffers(&[1, 2]);
    client.flush();

    assert!(!client.has_current_context());
    assert!(consumer.poll_owned().is_none(), "nothing was enqueued");

    // Dropped calls record no error either.
    assert_eq!(client.get_error(), glenum::INVALID_OPERATION);
}
