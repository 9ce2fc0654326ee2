use glink_ring::{transport_pair, CallError, TransportConfig};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn sync_call_returns_after_consumer_executes() {
    let (mut producer, consumer) = transport_pair(&TransportConfig::default());

    let executed = Arc::new(AtomicU32::new(0));
    let consumer_executed = executed.clone();

    let worker = std::thread::spawn(move || loop {
        let Some((opcode, token, _payload)) = consumer.poll_owned() else {
            std::thread::yield_now();
            continue;
        };
        consumer_executed.fetch_add(1, Ordering::SeqCst);
        if opcode == 99 {
            consumer.finish_with_reply(token, vec![0xAB]);
            break;
        }
        consumer.finish(token);
    });

    // A burst of async records followed by one sync call: the sync wait must
    // subsume every earlier async record of the same producer.
    for i in 0..50u32 {
        producer.post(1, &i.to_le_bytes());
    }
    let reply = producer.call(99, &[]).unwrap();
    assert_eq!(reply, vec![0xAB]);
    assert_eq!(executed.load(Ordering::SeqCst), 51);
    assert!(producer.last_completed_token() >= 51);

    worker.join().unwrap();
}

#[test]
fn completed_token_is_monotonic() {
    let (mut producer, consumer) = transport_pair(&TransportConfig::default());

    let mut last_seen = 0u32;
    for i in 0..200u32 {
        producer.post(2, &i.to_le_bytes());
        let (_opcode, token, _payload) = consumer.poll_owned().unwrap();
        consumer.finish(token);
        let completed = producer.last_completed_token();
        assert!(completed >= last_seen);
        last_seen = completed;
    }
    assert_eq!(last_seen, 200);
}

#[test]
fn sync_call_times_out_when_consumer_is_stuck() {
    let config = TransportConfig {
        sync_wait_timeout: Some(Duration::from_millis(50)),
        ..TransportConfig::default()
    };
    let (mut producer, _consumer) = transport_pair(&config);

    // Nothing ever executes the record.
    assert_eq!(producer.call(5, &[]), Err(CallError::TimedOut));
}

#[test]
fn async_posts_never_block() {
    let (mut producer, consumer) = transport_pair(&TransportConfig::default());
    let t1 = producer.post(3, &[1]);
    let t2 = producer.post(3, &[2]);
    assert!(t2 > t1);
    assert_eq!(producer.last_completed_token(), 0);

    let (_, token, payload) = consumer.poll_owned().unwrap();
    assert_eq!(payload, vec![1]);
    consumer.finish(token);
    let (_, token, payload) = consumer.poll_owned().unwrap();
    assert_eq!(payload, vec![2]);
    consumer.finish(token);
    assert_eq!(producer.last_completed_token(), t2);
}
