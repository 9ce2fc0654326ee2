//! Bounded ring buffer for variable-length command records.
//!
//! Design goals:
//! - Variable-sized records framed by the fixed header in [`crate::layout`].
//! - Records are always contiguous in storage; wrap-around is handled via an
//!   explicit wrap marker plus implicit padding when fewer than 4 bytes
//!   remain at the end of the buffer.
//! - Strict SPSC: exactly one producer thread calls `reserve`/`commit`,
//!   exactly one consumer thread calls `peek`/`advance_read`. The cursors are
//!   free-running `u32` byte offsets reduced modulo the capacity, so the read
//!   cursor can never pass the write cursor.
//! - A completion token rides alongside the cursors: the consumer advances it
//!   after executing each record, and synchronous producers block on it.

use crate::layout::{align_up, HEADER_BYTES, RECORD_ALIGN, WRAP_MARKER};
use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveError {
    /// Not enough free space right now; retry after the consumer drains.
    Full,
    /// The record can never fit in this ring.
    TooLarge,
}

/// In-process ring buffer pairing one issuing thread with one executing
/// thread. All cross-thread state is atomic; the blocking token wait is the
/// only place a lock is taken, and never on the async submission path.
pub struct RingBuffer {
    cap: u32,
    head: AtomicU32,
    tail: AtomicU32,

    completed: AtomicU32,
    completed_lock: Mutex<()>,
    completed_cond: Condvar,

    data_ptr: *mut u8,
    _storage: Box<[u8]>,
}

unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    pub fn new(capacity_bytes: usize) -> Self {
        assert!(capacity_bytes >= HEADER_BYTES);
        assert_eq!(capacity_bytes % RECORD_ALIGN, 0);
        assert!(capacity_bytes < u32::MAX as usize / 2);
        let mut storage = vec![0u8; capacity_bytes].into_boxed_slice();
        let data_ptr = storage.as_mut_ptr();
        Self {
            cap: capacity_bytes as u32,
            head: AtomicU32::new(0),
            tail: AtomicU32::new(0),
            completed: AtomicU32::new(0),
            completed_lock: Mutex::new(()),
            completed_cond: Condvar::new(),
            data_ptr,
            _storage: storage,
        }
    }

    pub fn capacity_bytes(&self) -> usize {
        self.cap as usize
    }

    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Bytes currently committed and not yet consumed (including padding).
    pub fn used_bytes(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.wrapping_sub(head) as usize
    }

    /// Reserve `size` contiguous bytes for one record.
    ///
    /// `size` must come from [`crate::record_size`] (header included, aligned).
    /// The reservation is invisible to the consumer until committed; dropping
    /// it without committing publishes nothing.
    pub fn reserve(&self, size: usize) -> Result<Reservation<'_>, ReserveError> {
        debug_assert!(size >= HEADER_BYTES && size % RECORD_ALIGN == 0);
        if size > self.cap as usize {
            return Err(ReserveError::TooLarge);
        }

        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Relaxed);
        let used = tail.wrapping_sub(head);
        debug_assert!(used <= self.cap);
        let free = (self.cap - used) as usize;

        let tail_index = (tail % self.cap) as usize;
        let remaining = self.cap as usize - tail_index;

        // A record never straddles the end of storage: pad out the tail
        // segment when it cannot hold the whole record.
        let padding = if remaining < size { remaining } else { 0 };

        if padding + size > free {
            return Err(ReserveError::Full);
        }

        Ok(Reservation {
            ring: self,
            tail,
            padding: padding as u32,
            size: size as u32,
        })
    }

    /// Next committed record, if any.
    ///
    /// Wrap markers and tail padding are skipped (but not consumed); the
    /// returned view's `advance_read` consumes them together with the record.
    pub fn peek(&self) -> Option<RecordView<'_>> {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Relaxed);
        if head == tail {
            return None;
        }

        let head_index = (head % self.cap) as usize;
        let remaining = self.cap as usize - head_index;

        let (skip, start_index) = if remaining < 4 {
            // Implicit padding: too small to even hold a wrap marker.
            (remaining, 0)
        } else if self.read_u32(head_index) == WRAP_MARKER {
            (remaining, 0)
        } else {
            (0, head_index)
        };

        // Padding is only ever committed together with the record behind it.
        debug_assert!(head.wrapping_add(skip as u32) != tail);

        let opcode = self.read_u32(start_index);
        let byte_size = self.read_u32(start_index + 4) as usize;
        let token = self.read_u32(start_index + 8);
        debug_assert!(byte_size >= HEADER_BYTES);
        let total = align_up(byte_size, RECORD_ALIGN);
        debug_assert!(start_index + total <= self.cap as usize);

        let payload = unsafe {
            core::slice::from_raw_parts(
                self.data_ptr.add(start_index + HEADER_BYTES),
                byte_size - HEADER_BYTES,
            )
        };

        Some(RecordView {
            opcode,
            token,
            payload,
            consume: (skip + total) as u32,
        })
    }

    /// Consume the record returned by [`peek`](Self::peek). The only read
    /// cursor mutator.
    pub fn advance_read(&self, view: RecordView<'_>) {
        let head = self.head.load(Ordering::Relaxed);
        self.head
            .store(head.wrapping_add(view.consume), Ordering::Release);
    }

    /// Last token the consumer finished executing. Non-decreasing within a
    /// token epoch; see [`wait_token`](Self::wait_token) for the wrap caveat.
    pub fn last_completed_token(&self) -> u32 {
        self.completed.load(Ordering::Acquire)
    }

    /// Record that every record up to and including `token` has executed.
    /// Called by the consumer after each record, async ones included, which
    /// is what lets one synchronous wait subsume all earlier async records.
    pub fn complete_token(&self, token: u32) {
        let _guard = self.completed_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.completed.store(token, Ordering::Release);
        self.completed_cond.notify_all();
    }

    /// Block until `last_completed_token >= token`, or until `timeout`
    /// elapses (`None` waits forever; there is no cancellation).
    ///
    /// Returns `false` on timeout. Token comparisons are plain `>=`; the
    /// 32-bit token space is assumed not to wrap while a wait is outstanding.
    pub fn wait_token(&self, token: u32, timeout: Option<Duration>) -> bool {
        if self.completed.load(Ordering::Acquire) >= token {
            return true;
        }
        let mut guard = self.completed_lock.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if self.completed.load(Ordering::Acquire) >= token {
                return true;
            }
            match timeout {
                None => {
                    guard = self
                        .completed_cond
                        .wait(guard)
                        .unwrap_or_else(|e| e.into_inner());
                }
                Some(dur) => {
                    let (g, result) = self
                        .completed_cond
                        .wait_timeout(guard, dur)
                        .unwrap_or_else(|e| e.into_inner());
                    guard = g;
                    if result.timed_out() {
                        return self.completed.load(Ordering::Acquire) >= token;
                    }
                }
            }
        }
    }

    fn read_u32(&self, index: usize) -> u32 {
        debug_assert!(index + 4 <= self.cap as usize);
        unsafe {
            let mut tmp = [0u8; 4];
            core::ptr::copy_nonoverlapping(self.data_ptr.add(index), tmp.as_mut_ptr(), 4);
            u32::from_le_bytes(tmp)
        }
    }

    fn write_u32(&self, index: usize, v: u32) {
        debug_assert!(index + 4 <= self.cap as usize);
        unsafe {
            let bytes = v.to_le_bytes();
            core::ptr::copy_nonoverlapping(bytes.as_ptr(), self.data_ptr.add(index), 4);
        }
    }
}

/// An uncommitted write slot returned by [`RingBuffer::reserve`].
pub struct Reservation<'a> {
    ring: &'a RingBuffer,
    tail: u32,
    padding: u32,
    size: u32,
}

impl Reservation<'_> {
    /// Writable bytes of the whole record (header + payload).
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let start = (self.tail.wrapping_add(self.padding) % self.ring.cap) as usize;
        debug_assert!(start + self.size as usize <= self.ring.cap as usize);
        unsafe { core::slice::from_raw_parts_mut(self.ring.data_ptr.add(start), self.size as usize) }
    }

    /// Fill in the record header and payload.
    pub fn write_record(&mut self, opcode: u32, token: u32, payload: &[u8]) {
        debug_assert_eq!(
            align_up(HEADER_BYTES + payload.len(), RECORD_ALIGN),
            self.size as usize
        );
        let byte_size = (HEADER_BYTES + payload.len()) as u32;
        let bytes = self.bytes_mut();
        bytes[0..4].copy_from_slice(&opcode.to_le_bytes());
        bytes[4..8].copy_from_slice(&byte_size.to_le_bytes());
        bytes[8..12].copy_from_slice(&token.to_le_bytes());
        bytes[HEADER_BYTES..HEADER_BYTES + payload.len()].copy_from_slice(payload);
    }

    /// Publish the record. The only write cursor mutator.
    pub fn commit(self) {
        if self.padding > 0 {
            let tail_index = (self.tail % self.ring.cap) as usize;
            // With fewer than 4 dead bytes there is no room for a marker; the
            // consumer treats such a tail segment as implicit padding.
            if self.ring.cap as usize - tail_index >= 4 {
                self.ring.write_u32(tail_index, WRAP_MARKER);
            }
        }
        let new_tail = self.tail.wrapping_add(self.padding + self.size);
        self.ring.tail.store(new_tail, Ordering::Release);
    }
}

/// A committed record as seen by the consumer. Holding the view borrows the
/// ring; consuming it via [`RingBuffer::advance_read`] releases the bytes for
/// reuse by the producer.
pub struct RecordView<'a> {
    pub opcode: u32,
    pub token: u32,
    pub payload: &'a [u8],
    pub(crate) consume: u32,
}
