//! Producer/consumer endpoint pair layered on the ring buffer.
//!
//! The producer owns the token sequence; the consumer owns record execution
//! and token completion. Synchronous calls round-trip a reply through a
//! single mutex-guarded cell: the consumer stores the reply bytes *before*
//! completing the call's token, and the blocked producer takes them after its
//! wait returns. SPSC plus the blocking sync call guarantee at most one
//! outstanding reply per pair.

use crate::layout::record_size;
use crate::ring::{RecordView, ReserveError, RingBuffer};
use crate::token::TokenSequence;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Construction parameters for one transport pair.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Ring storage size in bytes. Must be a multiple of 4.
    pub capacity_bytes: usize,
    /// Upper bound for synchronous-call waits. `None` waits forever; if the
    /// consumer thread dies, a pending synchronous call then blocks forever
    /// (documented fatal condition, not mitigated).
    pub sync_wait_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: 512 * 1024,
            sync_wait_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallError {
    /// The configured sync wait timeout elapsed.
    TimedOut,
    /// The consumer completed the token without storing a reply.
    MissingReply,
}

#[derive(Default)]
struct ReplyCell {
    slot: Mutex<Option<Vec<u8>>>,
}

impl ReplyCell {
    fn store(&self, bytes: Vec<u8>) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(bytes);
    }

    fn take(&self) -> Option<Vec<u8>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// Build one connected producer/consumer pair. Exactly one thread may drive
/// each endpoint.
pub fn transport_pair(config: &TransportConfig) -> (RingProducer, RingConsumer) {
    let ring = Arc::new(RingBuffer::new(config.capacity_bytes));
    let reply = Arc::new(ReplyCell::default());
    (
        RingProducer {
            ring: ring.clone(),
            reply: reply.clone(),
            tokens: TokenSequence::new(),
            sync_wait_timeout: config.sync_wait_timeout,
        },
        RingConsumer { ring, reply },
    )
}

/// Issuing-side endpoint.
pub struct RingProducer {
    ring: Arc<RingBuffer>,
    reply: Arc<ReplyCell>,
    tokens: TokenSequence,
    sync_wait_timeout: Option<Duration>,
}

impl RingProducer {
    /// Largest payload guaranteed to eventually fit on this ring.
    ///
    /// Records are contiguous, so a wrapping record must fit entirely in one
    /// of the two segments the cursor position splits the storage into; in
    /// the worst case that is half the ring.
    pub fn max_payload_bytes(&self) -> usize {
        let half = self.ring.capacity_bytes() / 2;
        (half - half % crate::layout::RECORD_ALIGN).saturating_sub(crate::layout::HEADER_BYTES)
    }

    pub fn last_completed_token(&self) -> u32 {
        self.ring.last_completed_token()
    }

    /// Enqueue a record and return immediately with its token.
    pub fn post(&mut self, opcode: u32, payload: &[u8]) -> u32 {
        let token = self.tokens.next();
        self.enqueue(opcode, token, payload);
        token
    }

    /// Enqueue a record and block until the consumer has executed it, then
    /// return the reply bytes it stored.
    pub fn call(&mut self, opcode: u32, payload: &[u8]) -> Result<Vec<u8>, CallError> {
        let token = self.tokens.next();
        self.enqueue(opcode, token, payload);
        if !self.ring.wait_token(token, self.sync_wait_timeout) {
            return Err(CallError::TimedOut);
        }
        self.reply.take().ok_or(CallError::MissingReply)
    }

    fn enqueue(&mut self, opcode: u32, token: u32, payload: &[u8]) {
        let size = record_size(payload.len());
        loop {
            match self.ring.reserve(size) {
                Ok(mut reservation) => {
                    reservation.write_record(opcode, token, payload);
                    reservation.commit();
                    return;
                }
                // A chronically full ring is never surfaced as an error, only
                // retried. Livelocks if the consumer is stuck.
                Err(ReserveError::Full) => std::thread::yield_now(),
                Err(ReserveError::TooLarge) => {
                    panic!("record payload ({} bytes) exceeds ring capacity", payload.len())
                }
            }
        }
    }
}

/// Executing-side endpoint.
pub struct RingConsumer {
    ring: Arc<RingBuffer>,
    reply: Arc<ReplyCell>,
}

impl RingConsumer {
    /// Next pending record, if any. Call [`finish`](Self::finish) (or
    /// [`finish_with_reply`](Self::finish_with_reply)) once it has executed.
    pub fn poll(&self) -> Option<RecordView<'_>> {
        self.ring.peek()
    }

    /// Decode-copy helper: take the next record as owned data, releasing its
    /// ring bytes immediately. Returns `(opcode, token, payload)`.
    pub fn poll_owned(&self) -> Option<(u32, u32, Vec<u8>)> {
        let view = self.ring.peek()?;
        let record = (view.opcode, view.token, view.payload.to_vec());
        self.ring.advance_read(view);
        Some(record)
    }

    /// Mark `token`'s record executed. Advances the completed token
    /// unconditionally, async records included.
    pub fn finish(&self, token: u32) {
        self.ring.complete_token(token);
    }

    /// Store a synchronous reply, then mark the record executed. The reply is
    /// visible to the producer strictly before its wait returns.
    pub fn finish_with_reply(&self, token: u32, reply: Vec<u8>) {
        self.reply.store(reply);
        self.ring.complete_token(token);
    }
}
