//! Reconnect backoff: exponential growth on failure, linear decay on
//! success.
//!
//! Grounded on spec.md §4.4's exact formula and the two worked sequences in
//! §8 (scenarios 1 and 2). Driven by caller-supplied `elapsed` durations
//! rather than reading the clock itself, so tests can feed the frozen/
//! synthetic timings the scenarios specify -- this is the generalization of
//! `ConnectionBuilder::connect`'s retry-with-sleep loop into a standalone,
//! clock-independent iterator.

use std::cmp::{max, min};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Backoff {
    max_sleep: Duration,
    threshold: Duration,
    recover: u64,
    sleep: Duration,
}

impl Backoff {
    pub fn new(max_sleep: Duration, threshold: Duration, recover: u64) -> Self {
        Backoff {
            max_sleep,
            threshold,
            recover: recover.max(1),
            sleep: Duration::ZERO,
        }
    }

    pub fn current_sleep(&self) -> Duration {
        self.sleep
    }

    /// Records that the most recent connection attempt lived for `elapsed`
    /// before ending, and computes the sleep to wait before retrying.
    pub fn record_attempt(&mut self, elapsed: Duration) -> Duration {
        self.sleep = if elapsed < self.threshold {
            let doubled = self.sleep.saturating_mul(2);
            min(max(doubled, Duration::from_secs(1)), self.max_sleep)
        } else {
            let decay = Duration::from_secs(elapsed.as_secs() / self.recover);
            self.sleep.checked_sub(decay).unwrap_or(Duration::ZERO)
        };
        self.sleep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_failure_sequence_matches_spec_scenario_1() {
        let mut backoff = Backoff::new(Duration::from_secs(300), Duration::from_secs(30), 5);
        let mut sequence = vec![backoff.current_sleep().as_secs()];
        for _ in 0..11 {
            sequence.push(backoff.record_attempt(Duration::ZERO).as_secs());
        }
        assert_eq!(
            sequence,
            vec![0, 1, 2, 4, 8, 16, 32, 64, 128, 256, 300, 300]
        );
    }

    #[test]
    fn pure_success_sequence_matches_spec_scenario_2() {
        let mut backoff = Backoff::new(Duration::from_secs(300), Duration::from_secs(30), 5);
        backoff.sleep = Duration::from_secs(300);
        let mut sequence = vec![backoff.current_sleep().as_secs()];
        for _ in 0..52 {
            sequence.push(backoff.record_attempt(Duration::from_secs(30)).as_secs());
        }
        assert_eq!(sequence[0], 300);
        assert_eq!(sequence[1], 294);
        assert_eq!(sequence[2], 288);
        // Decays by exactly 6 per iteration until it saturates at 0.
        assert_eq!(*sequence.last().unwrap(), 0);
        assert_eq!(sequence[sequence.len() - 2], 0);
    }

    #[test]
    fn success_sleep_never_increases() {
        let mut backoff = Backoff::new(Duration::from_secs(300), Duration::from_secs(30), 5);
        backoff.sleep = Duration::from_secs(100);
        let next = backoff.record_attempt(Duration::from_secs(60));
        assert!(next <= Duration::from_secs(100));
    }
}
