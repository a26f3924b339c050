//! Process-wide request budget for relays with a hard request ceiling

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::trace;

/// Direct (unkeyed) limiter shared by every clone: at most `limit` requests per second,
/// with bursts up to `limit`.
///
/// `acquire` waits for capacity instead of failing.
#[derive(Clone)]
pub struct RequestBudget {
    limit: NonZeroU32,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl RequestBudget {
    /// A zero limit is treated as one request per second
    pub fn per_second(limit: u32) -> Self {
        let limit = NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN);
        Self {
            limit,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(limit))),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit.get()
    }

    /// Waits until one more request fits in the budget
    pub async fn acquire(&self) {
        if self.limiter.check().is_ok() {
            return;
        }
        trace!(limit = self.limit.get(), "Request budget exhausted, waiting");
        self.limiter.until_ready().await;
    }

    /// Takes a slot if one is free right now
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}
