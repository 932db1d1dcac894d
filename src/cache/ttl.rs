//! Jittered refresh windows.
//!
//! Many processes that start together and share a refresh interval would
//! otherwise hit the backend in lockstep. Each deadline is instead drawn from
//! the latter half of the configured interval.

use rand::Rng;
use std::time::Duration;

/// Pick a TTL `t` with `max / 2 <= t < max`.
///
/// Returns zero for a zero interval. Stateless apart from the thread-local RNG.
pub fn choose_ttl(max: Duration) -> Duration {
    let max_nanos = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
    let lower = max_nanos - max_nanos / 2;
    if lower >= max_nanos {
        return Duration::from_nanos(max_nanos / 2);
    }
    Duration::from_nanos(rand::thread_rng().gen_range(lower..max_nanos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_choose_ttl_stays_in_latter_half() {
        let max = Duration::from_millis(20);
        for _ in 0..1000 {
            let ttl = choose_ttl(max);
            assert!(ttl >= Duration::from_millis(10), "{:?} below lower bound", ttl);
            assert!(ttl < max, "{:?} not below {:?}", ttl, max);
        }
    }

    #[test]
    fn test_choose_ttl_zero_interval() {
        assert_eq!(choose_ttl(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_choose_ttl_spreads_values() {
        let max = Duration::from_secs(3600);
        let first = choose_ttl(max);
        assert!((0..50).map(|_| choose_ttl(max)).any(|ttl| ttl != first));
    }

    proptest! {
        #[test]
        fn choose_ttl_bounds(max_ms in 1u64..10_000_000) {
            let max = Duration::from_millis(max_ms);
            let ttl = choose_ttl(max);
            prop_assert!(ttl * 2 >= max);
            prop_assert!(ttl < max);
        }
    }
}
