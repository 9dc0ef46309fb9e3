use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Minimal inter-request pacing between upstream attempts, so one
/// resolution call walking the source chain does not immediately
/// re-trigger the rate limits it is trying to route around.
#[derive(Clone)]
pub struct SourcePacer {
    limiter: Option<Arc<DirectRateLimiter>>,
    pace: Duration,
}

impl SourcePacer {
    /// A zero pace disables the limiter entirely.
    pub fn new(pace: Duration) -> Self {
        if pace.is_zero() {
            return Self {
                limiter: None,
                pace,
            };
        }

        let quota = Quota::with_period(pace)
            .expect("pacing period is non-zero")
            .allow_burst(NonZeroU32::MIN);

        Self {
            limiter: Some(Arc::new(RateLimiter::direct(quota))),
            pace,
        }
    }

    pub const fn pace(&self) -> Duration {
        self.pace
    }

    /// Recommended delay before the next upstream attempt. `None` means
    /// budget is available and the attempt can go out immediately.
    pub fn delay(&self) -> Option<Duration> {
        let limiter = self.limiter.as_ref()?;
        if limiter.check().is_ok() {
            None
        } else {
            Some(self.pace)
        }
    }
}
