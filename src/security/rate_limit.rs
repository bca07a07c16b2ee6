//! Outbound line pacing.
//!
//! IRC servers disconnect clients that write too fast. Every line the warden
//! sends passes through a [`LinePacer`], a `governor` token bucket that
//! releases one line per configured period.

use governor::{Quota, RateLimiter as GovRateLimiter};
use nonzero_ext::nonzero;
use std::time::Duration;
use tracing::debug;

/// Type alias for governor's direct rate limiter.
type DirectRateLimiter = governor::DefaultDirectRateLimiter;

/// Paces outgoing lines to at most one per `linerate` seconds.
///
/// A linerate of zero disables pacing.
#[derive(Debug)]
pub struct LinePacer {
    limiter: Option<DirectRateLimiter>,
}

impl LinePacer {
    /// Create a pacer releasing one line every `linerate` seconds.
    pub fn new(linerate: f64) -> Self {
        let period = if linerate.is_finite() && linerate > 0.0 {
            Some(Duration::from_secs_f64(linerate))
        } else {
            None
        };

        let limiter = period
            .and_then(Quota::with_period)
            .map(|quota| GovRateLimiter::direct(quota.allow_burst(nonzero!(1u32))));

        if limiter.is_none() {
            debug!(linerate, "outbound pacing disabled");
        }

        Self { limiter }
    }

    /// Wait until the next line may be written.
    pub async fn ready(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Non-blocking variant of [`ready`](Self::ready).
    #[cfg(test)]
    fn try_acquire(&self) -> bool {
        match &self.limiter {
            Some(limiter) => limiter.check().is_ok(),
            None => true,
        }
    }
}
