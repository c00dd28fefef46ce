use governor::clock::{Clock, MonotonicClock};
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

type DirectLimiter =
    RateLimiter<NotKeyed, InMemoryState, MonotonicClock, NoOpMiddleware<<MonotonicClock as Clock>::Instant>>;

/// Blocking rate limiter shared between every caller holding a clone.
#[derive(Clone)]
pub struct Limiter {
    inner: Arc<DirectLimiter>,
    clock: MonotonicClock,
}

impl Limiter {
    /// Lets one call through immediately, then at most one per `period`.
    /// Returns `None` for a zero period (no limiting).
    pub fn with_period(period: Duration) -> Option<Self> {
        let quota = Quota::with_period(period)?.allow_burst(NonZeroU32::MIN);
        Some(Self::from_quota(quota))
    }

    fn from_quota(quota: Quota) -> Self {
        let clock = MonotonicClock;
        Self {
            inner: Arc::new(RateLimiter::direct_with_clock(quota, &clock)),
            clock,
        }
    }

    /// Blocks the calling thread until the next call is allowed.
    pub fn wait(&self) {
        while let Err(not_until) = self.inner.check() {
            let pause = not_until.wait_time_from(self.clock.now());
            log::trace!("Rate limited, sleeping {:?}", pause);
            thread::sleep(pause);
        }
    }
}

/// One request per second with no burst, the public OSRM demo server's fair-use policy.
pub fn osrm_limiter() -> Limiter {
    Limiter::from_quota(Quota::per_second(NonZeroU32::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn first_call_is_immediate() {
        let limiter = Limiter::with_period(Duration::from_secs(5)).unwrap();
        let started = Instant::now();
        limiter.wait();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn consecutive_calls_are_spaced() {
        let limiter = Limiter::with_period(Duration::from_millis(100)).unwrap();
        let started = Instant::now();
        for _ in 0..3 {
            limiter.wait();
        }
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn osrm_limiter_allows_one_request_per_second() {
        let limiter = osrm_limiter();
        let started = Instant::now();
        limiter.wait();
        assert!(started.elapsed() < Duration::from_millis(500));
        limiter.wait();
        assert!(started.elapsed() >= Duration::from_millis(900));
    }

    #[test]
    fn zero_period_disables_limiting() {
        assert!(Limiter::with_period(Duration::ZERO).is_none());
    }
}
