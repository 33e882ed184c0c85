use std::time::{Duration, Instant};

use crate::shared::constants::DEFAULT_TICK_RATE_HZ;

/// Paces the render loop to a fixed refresh rate.
///
/// A tick that overruns its slot does not cause a burst of catch-up ticks;
/// the schedule restarts from the late tick.
pub struct FrameClock {
    period: Duration,
    next: Option<Instant>,
}

impl FrameClock {
    /// Non-positive or non-finite rates fall back to the default.
    pub fn new(rate_hz: f64) -> Self {
        let rate = if rate_hz.is_finite() && rate_hz > 0.0 {
            rate_hz
        } else {
            DEFAULT_TICK_RATE_HZ
        };
        Self {
            period: Duration::from_secs_f64(1.0 / rate),
            next: None,
        }
    }

    /// A clock that never sleeps.
    pub fn unpaced() -> Self {
        Self {
            period: Duration::ZERO,
            next: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Blocks until the next tick is due.
    pub fn wait(&mut self) {
        let now = Instant::now();
        let due = self.next.unwrap_or(now);
        if due > now {
            std::thread::sleep(due - now);
            self.next = Some(due + self.period);
        } else {
            self.next = Some(now + self.period);
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE_HZ)
    }
}
