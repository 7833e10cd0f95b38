//! Pacing of outbound requests.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Something every request to the hosting service passes through first.
pub trait Gate: Send + Sync {
    /// Blocks until the caller may send one request.
    fn wait(&self);
}

/// Lets requests through no closer than `interval` apart, across all threads
/// sharing it.
#[derive(Debug)]
pub struct IntervalGate {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl IntervalGate {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }
}

impl Gate for IntervalGate {
    fn wait(&self) {
        let slot = {
            let mut next_slot = self.next_slot.lock();
            let now = Instant::now();
            let slot = next_slot.map_or(now, |next| next.max(now));
            *next_slot = Some(slot + self.interval);
            slot
        };
        let now = Instant::now();
        if slot > now {
            std::thread::sleep(slot - now);
        }
    }
}

/// Never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGate;

impl Gate for NoopGate {
    fn wait(&self) {}
}
