//! Random source used for fingerprint selection and delay jitter.

use std::time::Duration;

use rand::Rng;

/// A source of uniformly distributed integers.
///
/// Injected wherever the scraper makes a random choice so tests can
/// supply a scripted sequence instead.
pub trait RandomSource: Send + Sync {
    /// Returns an integer drawn uniformly from `low..=high`.
    fn between(&self, low: u64, high: u64) -> u64;

    /// Returns an index drawn uniformly from `0..len`. `len` must be non-zero.
    fn index(&self, len: usize) -> usize {
        self.between(0, len.saturating_sub(1) as u64) as usize
    }
}

/// Random source backed by the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn between(&self, low: u64, high: u64) -> u64 {
        if low >= high {
            return low;
        }
        rand::thread_rng().gen_range(low..=high)
    }
}

/// Inclusive millisecond range a jittered delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Draws a delay from the range.
    pub fn sample(&self, random: &dyn RandomSource) -> Duration {
        Duration::from_millis(random.between(self.min_ms, self.max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u64);

    impl RandomSource for Fixed {
        fn between(&self, low: u64, high: u64) -> u64 {
            self.0.clamp(low, high)
        }
    }

    #[test]
    fn test_thread_random_stays_in_range() {
        let random = ThreadRandom;
        for _ in 0..200 {
            let value = random.between(1000, 3000);
            assert!((1000..=3000).contains(&value));
        }
    }

    #[test]
    fn test_thread_random_degenerate_range() {
        assert_eq!(ThreadRandom.between(7, 7), 7);
        assert_eq!(ThreadRandom.between(9, 3), 9);
    }

    #[test]
    fn test_index_single_element() {
        for _ in 0..20 {
            assert_eq!(ThreadRandom.index(1), 0);
        }
    }

    #[test]
    fn test_index_within_bounds() {
        for _ in 0..100 {
            assert!(ThreadRandom.index(3) < 3);
        }
    }

    #[test]
    fn test_delay_range_sample() {
        let range = DelayRange::new(2000, 5000);
        assert_eq!(range.sample(&Fixed(2500)), Duration::from_millis(2500));
        assert_eq!(range.sample(&Fixed(0)), Duration::from_millis(2000));
        assert_eq!(range.sample(&Fixed(9999)), Duration::from_millis(5000));
    }
}
