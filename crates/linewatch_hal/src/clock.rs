use crate::traits::Tick;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Monotonic tick counter. Non-decreasing until it wraps at `u32::MAX`;
/// consumers compare instants with `wrapping_sub` only.
pub trait Clock {
    fn now(&self) -> Tick;
}

/// Wall-clock ticks derived from `Instant`, at a fixed number of
/// milliseconds per tick.
pub struct SystemClock {
    origin: Instant,
    tick: Duration,
}

impl SystemClock {
    pub fn new(tick_ms: u64) -> Self {
        Self {
            origin: Instant::now(),
            tick: Duration::from_millis(tick_ms.max(1)),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Tick {
        // Truncating cast keeps the counter modular past the u32 bound.
        (self.origin.elapsed().as_millis() / self.tick.as_millis()) as Tick
    }
}

/// Manually advanced clock for tests and simulation. Clones share the
/// same counter, so a test can hold one handle while the engine owns
/// another.
#[derive(Clone, Default)]
pub struct SimClock {
    ticks: Arc<AtomicU32>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, n: Tick) {
        self.ticks.fetch_add(n, Ordering::Relaxed);
    }

    pub fn set(&self, tick: Tick) {
        self.ticks.store(tick, Ordering::Relaxed);
    }
}

impl Clock for SimClock {
    fn now(&self) -> Tick {
        self.ticks.load(Ordering::Relaxed)
    }
}
