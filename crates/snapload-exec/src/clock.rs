//! Run-start timestamps.

use std::sync::Mutex;

use chrono::Local;

use snapload_core::watermark::Watermark;

pub trait Clock {
    /// Current time at watermark precision (whole seconds).
    fn now(&self) -> Watermark;
}

/// Local wall-clock time, matching how sources usually stamp `updated_at`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Watermark {
        Watermark::from_datetime(Local::now().naive_local())
    }
}

/// Settable clock for tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<Watermark>,
}

impl FixedClock {
    pub fn new(now: Watermark) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: Watermark) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Watermark {
        self.now.lock().unwrap().clone()
    }
}

/// Milliseconds since the Unix epoch, for manifests.
pub(crate) fn unix_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_well_formed_and_after_epoch() {
        let now = SystemClock.now();
        assert!(Watermark::parse(now.as_str()).is_ok());
        assert!(now > Watermark::epoch());
    }

    #[test]
    fn fixed_clock_can_move() {
        let clock = FixedClock::new(Watermark::parse("2024-05-01 08:00:00").unwrap());
        assert_eq!(clock.now().as_str(), "2024-05-01 08:00:00");
        clock.set(Watermark::parse("2024-05-02 08:00:00").unwrap());
        assert_eq!(clock.now().as_str(), "2024-05-02 08:00:00");
    }
}
