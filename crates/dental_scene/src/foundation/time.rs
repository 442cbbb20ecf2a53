//! Time sources
//!
//! Animation code takes the current time as an argument; the viewer owns a
//! [`Clock`] and hands its reading down every frame.

use std::cell::Cell;
use std::time::Instant;

/// Source of the current time in seconds
pub trait Clock {
    /// Seconds elapsed since an arbitrary, fixed origin
    fn now_s(&self) -> f64;
}

/// Monotonic wall clock measured from its creation
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Create a clock starting at zero now
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Clock for SystemClock {
    fn now_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    /// Create a clock reading `now` seconds
    pub fn new(now: f64) -> Self {
        Self { now: Cell::new(now) }
    }

    /// Jump to an absolute time
    pub fn set(&self, now: f64) {
        self.now.set(now);
    }

    /// Move forward by `dt` seconds
    pub fn advance(&self, dt: f64) {
        self.now.set(self.now.get() + dt);
    }
}

impl Clock for ManualClock {
    fn now_s(&self) -> f64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now_s(&self) -> f64 {
        (**self).now_s()
    }
}
