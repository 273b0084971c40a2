use std::ops::{Add, Sub};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Seconds since the clock's origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Timestamp(f64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0.0);

    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// Seconds elapsed from `earlier` to `self` (negative if `earlier` is later).
    pub fn since(self, earlier: Timestamp) -> f64 {
        self.0 - earlier.0
    }
}

impl Add<f64> for Timestamp {
    type Output = Timestamp;

    fn add(self, secs: f64) -> Timestamp {
        Timestamp(self.0 + secs)
    }
}

impl Sub<f64> for Timestamp {
    type Output = Timestamp;

    fn sub(self, secs: f64) -> Timestamp {
        Timestamp(self.0 - secs)
    }
}

/// Monotonic tick source shared by the render and input threads.
pub trait PresentationClock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by [`Instant`], starting at zero when created.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationClock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.origin.elapsed().as_secs_f64())
    }
}

/// Clock that only moves when told to. Clones share the same time, so a test
/// (or the headless simulator) can keep one handle and give another to the
/// presenter.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, at: Timestamp) {
        self.bits.store(at.0.to_bits(), Ordering::Release);
    }

    pub fn advance(&self, secs: f64) -> Timestamp {
        let next = self.now() + secs;
        self.set(next);
        next
    }
}

impl PresentationClock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(f64::from_bits(self.bits.load(Ordering::Acquire)))
    }
}
