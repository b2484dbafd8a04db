//! Fixed-capacity multi-producer, single-consumer ring
//!
//! Sequences are handed out by an atomic claim cursor. A slot for sequence
//! `s` is only reused for `s + capacity` after the consumer has moved past
//! `s`, so a producer never overwrites a slot the consumer has not read.
//!
//! Each slot carries a `published` stamp holding `sequence + 1` of the last
//! publish into it. The consumer treats sequence `s` as ready once the stamp
//! of slot `s & mask` equals `s + 1`, which lets producers publish out of
//! order while the consumer still observes sequences strictly in order.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, Thread};
use std::time::Duration;

use log::error;

use crate::error::{DispatcherError, Result};
use crate::request::CorrelatedRequest;

// Ring state constants
pub(crate) const RING_STATE_RUNNING: u8 = 0;
pub(crate) const RING_STATE_SHUTTING_DOWN: u8 = 1;
pub(crate) const RING_STATE_STOPPED: u8 = 2;

const SPIN_STEPS: u32 = 6;
const YIELD_STEPS: u32 = 16;
const PRODUCER_PARK: Duration = Duration::from_micros(50);

/// Keeps hot cursors on separate cache lines
#[repr(align(64))]
struct Padded<T>(T);

impl<T> Deref for Padded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

struct Slot {
    published: AtomicU64,
    request: UnsafeCell<CorrelatedRequest>,
}

pub struct RingBuffer {
    slots: Box<[Slot]>,
    mask: u64,
    capacity: u64,
    claim_cursor: Padded<AtomicU64>,
    consumed: Padded<AtomicU64>,
    in_flight: AtomicUsize,
    state: AtomicU8,
    consumer_parked: AtomicBool,
    consumer_thread: OnceLock<Thread>,
}

// SAFETY: a slot's request is written only by the producer holding its
// claimed sequence (exclusive until the Release store of `published`), and
// read only by the single consumer after an Acquire load of that stamp.
unsafe impl Sync for RingBuffer {}
unsafe impl Send for RingBuffer {}

impl RingBuffer {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(DispatcherError::InvalidCapacity(capacity));
        }

        let slots = (0..capacity)
            .map(|_| Slot {
                published: AtomicU64::new(0),
                request: UnsafeCell::new(CorrelatedRequest::default()),
            })
            .collect();

        Ok(Self {
            slots,
            mask: capacity as u64 - 1,
            capacity: capacity as u64,
            claim_cursor: Padded(AtomicU64::new(0)),
            consumed: Padded(AtomicU64::new(0)),
            in_flight: AtomicUsize::new(0),
            state: AtomicU8::new(RING_STATE_RUNNING),
            consumer_parked: AtomicBool::new(false),
            consumer_thread: OnceLock::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Reserve the next sequence, waiting while the ring is full
    ///
    /// Fails with `ShutDown` once shutdown has begun, and with
    /// `ConsumerStopped` if the consumer dies while this producer waits.
    pub fn claim_next(&self) -> Result<ClaimedSlot<'_>> {
        // Registering before the state check pairs with the consumer reading
        // state then `in_flight`; both sides use SeqCst.
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.state.load(Ordering::SeqCst) != RING_STATE_RUNNING {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(DispatcherError::ShutDown);
        }

        let sequence = self.claim_cursor.fetch_add(1, Ordering::AcqRel);

        if let Err(e) = self.wait_for_capacity(sequence) {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(e);
        }

        Ok(ClaimedSlot {
            ring: self,
            sequence,
            published: false,
        })
    }

    /// Mark a claimed sequence as ready for the consumer
    ///
    /// Only `ClaimedSlot` calls this, exactly once per claimed sequence.
    fn publish(&self, sequence: u64) {
        self.slot(sequence)
            .published
            .store(sequence + 1, Ordering::Release);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.wake_consumer();
    }

    fn wait_for_capacity(&self, sequence: u64) -> Result<()> {
        let mut step = 0u32;
        while sequence >= self.consumed.load(Ordering::Acquire) + self.capacity {
            if self.state.load(Ordering::Acquire) == RING_STATE_STOPPED {
                error!(
                    "Dispatcher consumer stopped while sequence {} waited for a free slot",
                    sequence
                );
                return Err(DispatcherError::ConsumerStopped);
            }
            self.wake_consumer();
            backoff(&mut step, PRODUCER_PARK);
        }
        Ok(())
    }

    fn slot(&self, sequence: u64) -> &Slot {
        &self.slots[(sequence & self.mask) as usize]
    }

    pub(crate) fn is_published(&self, sequence: u64) -> bool {
        self.slot(sequence).published.load(Ordering::Acquire) == sequence + 1
    }

    /// # Safety
    ///
    /// Caller must be the consumer and `is_published(sequence)` must have
    /// returned true without `release_up_to` having passed `sequence` since.
    pub(crate) unsafe fn read(&self, sequence: u64) -> &CorrelatedRequest {
        unsafe { &*self.slot(sequence).request.get() }
    }

    /// Hand slots below `sequence` back to producers
    pub(crate) fn release_up_to(&self, sequence: u64) {
        self.consumed.store(sequence, Ordering::Release);
    }

    pub(crate) fn claimed(&self) -> u64 {
        self.claim_cursor.load(Ordering::Acquire)
    }

    pub(crate) fn consumed(&self) -> u64 {
        self.consumed.load(Ordering::Acquire)
    }

    pub(crate) fn state(&self) -> u8 {
        self.state.load(Ordering::SeqCst)
    }

    /// Move to `SHUTTING_DOWN`; returns false if already past running
    pub(crate) fn begin_shutdown(&self) -> bool {
        let changed = self
            .state
            .compare_exchange(
                RING_STATE_RUNNING,
                RING_STATE_SHUTTING_DOWN,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        self.wake_consumer();
        changed
    }

    pub(crate) fn mark_stopped(&self) {
        self.state.store(RING_STATE_STOPPED, Ordering::SeqCst);
    }

    /// True once shutdown was requested and every claimed sequence has been
    /// consumed, with no producer between claim and publish
    pub(crate) fn is_drained(&self, next: u64) -> bool {
        self.state() != RING_STATE_RUNNING
            && self.in_flight.load(Ordering::SeqCst) == 0
            && self.claimed() == next
    }

    pub(crate) fn register_consumer(&self) {
        let _ = self.consumer_thread.set(thread::current());
    }

    pub(crate) fn park_consumer(&self, timeout: Duration) {
        self.consumer_parked.store(true, Ordering::SeqCst);
        thread::park_timeout(timeout);
        self.consumer_parked.store(false, Ordering::SeqCst);
    }

    fn wake_consumer(&self) {
        if self.consumer_parked.load(Ordering::SeqCst)
            && let Some(consumer) = self.consumer_thread.get()
        {
            consumer.unpark();
        }
    }
}

/// Spin, then yield, then park for `park`
pub(crate) fn backoff(step: &mut u32, park: Duration) {
    if *step < SPIN_STEPS {
        for _ in 0..(1u32 << *step) {
            std::hint::spin_loop();
        }
    } else if *step < YIELD_STEPS {
        thread::yield_now();
    } else {
        thread::park_timeout(park);
    }
    *step = step.saturating_add(1);
}

/// Exclusive write access to one claimed slot
///
/// Call `publish` to hand the slot to the consumer. Dropping the guard
/// without publishing clears the slot and publishes it empty, so the
/// consumer skips it instead of stalling on the gap.
pub struct ClaimedSlot<'a> {
    ring: &'a RingBuffer,
    sequence: u64,
    published: bool,
}

impl ClaimedSlot<'_> {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn publish(mut self) {
        self.published = true;
        self.ring.publish(self.sequence);
    }
}

impl Deref for ClaimedSlot<'_> {
    type Target = CorrelatedRequest;

    fn deref(&self) -> &CorrelatedRequest {
        // SAFETY: the claimed sequence is exclusively ours until publish
        unsafe { &*self.ring.slot(self.sequence).request.get() }
    }
}

impl DerefMut for ClaimedSlot<'_> {
    fn deref_mut(&mut self) -> &mut CorrelatedRequest {
        // SAFETY: as above
        unsafe { &mut *self.ring.slot(self.sequence).request.get() }
    }
}

impl Drop for ClaimedSlot<'_> {
    fn drop(&mut self) {
        if !self.published {
            self.deref_mut().clear();
            self.ring.publish(self.sequence);
        }
    }
}
