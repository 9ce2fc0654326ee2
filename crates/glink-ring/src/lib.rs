//! Bounded single-producer/single-consumer transport for GL command records.
//!
//! One issuing thread encodes command records into a fixed-capacity ring
//! buffer; one executing thread decodes and runs them. The pair is
//! synchronized purely through the ring's cursors and a monotonically
//! advancing completion token, so the per-record hot path takes no locks.
//! Synchronous calls additionally block on a condvar until the consumer has
//! completed their token, with an optional timeout and no cancellation.

mod layout;
mod ring;
mod token;
mod transport;

pub use layout::{record_size, HEADER_BYTES, RECORD_ALIGN, WRAP_MARKER};
pub use ring::{RecordView, Reservation, ReserveError, RingBuffer};
pub use token::{TokenSequence, TOKEN_UNSET};
pub use transport::{transport_pair, CallError, RingConsumer, RingProducer, TransportConfig};
