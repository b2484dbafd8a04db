use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info};
use parking_lot::Mutex;

use crate::error::{DispatcherError, Result};
use crate::request::CorrelatedRequest;
use crate::ring::{self, ClaimedSlot, RING_STATE_RUNNING, RingBuffer};

const CONSUMER_PARK: Duration = Duration::from_millis(1);

/// Configuration for a dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of ring slots; must be a power of two
    pub capacity: usize,
    /// Name given to the consumer thread
    pub thread_name: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            thread_name: "hermes-dispatcher".to_string(),
        }
    }
}

impl DispatcherConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }
}

/// Snapshot of dispatcher counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatcherStats {
    pub capacity: usize,
    pub claimed: u64,
    pub dispatched: u64,
    pub failed: u64,
    pub skipped: u64,
    pub pending: u64,
}

#[derive(Default)]
struct Counters {
    dispatched: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

/// Ring buffer plus the thread that drains it
///
/// The consumer closure receives every published request exactly once, in
/// sequence order. An `Err` or a panic from it is logged and counted, and
/// the loop moves on to the next sequence.
pub struct Dispatcher {
    ring: Arc<RingBuffer>,
    counters: Arc<Counters>,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn start<F, E>(config: DispatcherConfig, consumer: F) -> Result<Self>
    where
        F: FnMut(&CorrelatedRequest) -> std::result::Result<(), E> + Send + 'static,
        E: Display,
    {
        let ring = Arc::new(RingBuffer::new(config.capacity)?);
        let counters = Arc::new(Counters::default());

        let thread_handle = {
            let ring = Arc::clone(&ring);
            let counters = Arc::clone(&counters);
            thread::Builder::new()
                .name(config.thread_name.clone())
                .spawn(move || run(ring, counters, consumer))
                .map_err(|e| DispatcherError::Spawn(e.to_string()))?
        };

        info!(
            "Dispatcher '{}' started with {} slots",
            config.thread_name, config.capacity
        );

        Ok(Self {
            ring,
            counters,
            consumer: Mutex::new(Some(thread_handle)),
        })
    }

    /// Claim a slot to fill in place; see `ClaimedSlot`
    pub fn claim_next(&self) -> Result<ClaimedSlot<'_>> {
        self.ring.claim_next()
    }

    /// Copy `destination` and `payload` into the next slot and publish it
    ///
    /// Returns the sequence the request was published under.
    pub fn dispatch(&self, destination: &str, payload: &[u8]) -> Result<u64> {
        let mut slot = self.ring.claim_next()?;
        slot.set(destination, payload);
        let sequence = slot.sequence();
        slot.publish();
        Ok(sequence)
    }

    /// Stop accepting claims, drain what was published and join the
    /// consumer thread
    ///
    /// Safe to call more than once.
    pub fn shutdown(&self) {
        if self.ring.begin_shutdown() {
            info!("Dispatcher shutting down");
        }

        let handle = self.consumer.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Dispatcher consumer thread panicked during shutdown");
            }
            let stats = self.stats();
            info!(
                "Dispatcher stopped: {} dispatched, {} failed, {} skipped",
                stats.dispatched, stats.failed, stats.skipped
            );
        }
    }

    pub fn is_running(&self) -> bool {
        self.ring.state() == RING_STATE_RUNNING
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn stats(&self) -> DispatcherStats {
        let claimed = self.ring.claimed();
        DispatcherStats {
            capacity: self.ring.capacity(),
            claimed,
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            pending: claimed.saturating_sub(self.ring.consumed()),
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Marks the ring stopped however the consumer loop exits
struct StopGuard<'a>(&'a RingBuffer);

impl Drop for StopGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_stopped();
    }
}

/// Consumer loop - drains contiguous runs of published sequences
fn run<F, E>(ring: Arc<RingBuffer>, counters: Arc<Counters>, mut consumer: F)
where
    F: FnMut(&CorrelatedRequest) -> std::result::Result<(), E>,
    E: Display,
{
    let _stopped = StopGuard(ring.as_ref());
    ring.register_consumer();
    debug!("Dispatcher consumer running");

    let capacity = ring.capacity() as u64;
    let mut next = 0u64;
    let mut idle = 0u32;

    loop {
        let mut end = next;
        while end - next < capacity && ring.is_published(end) {
            end += 1;
        }

        if end > next {
            for sequence in next..end {
                // SAFETY: published and not yet released
                let request = unsafe { ring.read(sequence) };
                deliver(sequence, request, &mut consumer, &counters);
            }
            ring.release_up_to(end);
            next = end;
            idle = 0;
            continue;
        }

        if ring.is_drained(next) {
            break;
        }

        if idle < 16 {
            ring::backoff(&mut idle, CONSUMER_PARK);
        } else {
            ring.park_consumer(CONSUMER_PARK);
        }
    }

    debug!("Dispatcher consumer drained at sequence {}", next);
}

fn deliver<F, E>(sequence: u64, request: &CorrelatedRequest, consumer: &mut F, counters: &Counters)
where
    F: FnMut(&CorrelatedRequest) -> std::result::Result<(), E>,
    E: Display,
{
    if request.is_empty() {
        debug!("Skipping abandoned sequence {}", sequence);
        counters.skipped.fetch_add(1, Ordering::Relaxed);
        return;
    }

    match panic::catch_unwind(AssertUnwindSafe(|| consumer(request))) {
        Ok(Ok(())) => {
            counters.dispatched.fetch_add(1, Ordering::Relaxed);
        }
        Ok(Err(e)) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            error!(
                "Failed to publish sequence {} to '{}': {}",
                sequence,
                request.destination(),
                e
            );
        }
        Err(_) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            error!(
                "Publisher panicked on sequence {} to '{}'",
                sequence,
                request.destination()
            );
        }
    }
}
