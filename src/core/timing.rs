//! Blocking delays
//!
//! Every wait the link performs (boot grace, settle time, poll spacing) goes
//! through a [`Sleeper`] so the timing discipline can be checked without a
//! wall clock.

use std::time::Duration;

/// Source of blocking delays
pub trait Sleeper {
    /// Block the caller for `duration`
    fn sleep(&mut self, duration: Duration);
}

/// Sleeper backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Sleeper that returns immediately and remembers every requested delay
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    calls: Vec<Duration>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order
    pub fn calls(&self) -> &[Duration] {
        &self.calls
    }

    /// Sum of all requested delays
    pub fn total(&self) -> Duration {
        self.calls.iter().sum()
    }

    /// Delays of at least `threshold`, i.e. the ones that are not poll spacing
    pub fn calls_at_least(&self, threshold: Duration) -> Vec<Duration> {
        self.calls.iter().copied().filter(|d| *d >= threshold).collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.calls.push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sleeper_keeps_order() {
        let mut sleeper = RecordingSleeper::new();
        sleeper.sleep(Duration::from_secs(10));
        sleeper.sleep(Duration::from_millis(10));
        sleeper.sleep(Duration::from_secs(2));

        assert_eq!(
            sleeper.calls(),
            &[Duration::from_secs(10), Duration::from_millis(10), Duration::from_secs(2)]
        );
        assert_eq!(sleeper.total(), Duration::from_millis(12_010));
        assert_eq!(
            sleeper.calls_at_least(Duration::from_secs(1)),
            vec![Duration::from_secs(10), Duration::from_secs(2)]
        );

        sleeper.clear();
        assert!(sleeper.calls().is_empty());
    }
}
