//! Inter-request pacing for batch downloads.
//!
//! This module provides the [`Pacer`] struct which spaces consecutive download
//! attempts according to a [`PacingPolicy`], so a manifest of hundreds of
//! rows does not hit the server as fast as the network allows.
//!
//! # Overview
//!
//! The first request always proceeds immediately. Every later request waits
//! as the policy dictates:
//!
//! - [`PacingPolicy::None`] never waits (tests, trusted local mirrors)
//! - [`PacingPolicy::Fixed`] sleeps the given delay after each download finishes
//! - [`PacingPolicy::TokenBucket`] allows a short burst, then a steady rate
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use manifest_fetch::download::{Pacer, PacingPolicy};
//!
//! # async fn example() {
//! let pacer = Pacer::new(PacingPolicy::Fixed(Duration::from_secs(5)));
//!
//! // First request proceeds immediately
//! pacer.acquire().await;
//! // ... download ...
//! pacer.complete().await;
//!
//! // Second request waits five seconds after the first one finished
//! pacer.acquire().await;
//! # }
//! ```

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Delay between downloads used when nothing else is configured.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// Rule governing the delay between consecutive download attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PacingPolicy {
    /// No delay at all.
    None,
    /// Delay between the end of one download and the start of the next.
    Fixed(Duration),
    /// Token bucket: up to `burst` requests back to back, refilled at
    /// `rate_per_sec` tokens per second.
    TokenBucket {
        /// Refill rate in tokens per second. Must be positive.
        rate_per_sec: f64,
        /// Bucket capacity. Must be at least 1.
        burst: u32,
    },
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_DELAY)
    }
}

/// Applies a [`PacingPolicy`] across successive [`Pacer::acquire`] calls.
#[derive(Debug)]
pub struct Pacer {
    policy: PacingPolicy,
    state: Mutex<PacerState>,
}

#[derive(Debug)]
struct PacerState {
    /// Start of the previous request. `None` until the first request.
    last_request: Option<Instant>,
    /// End of the previous request, as reported by [`Pacer::complete`].
    last_completed: Option<Instant>,
    /// Tokens available (token bucket only).
    tokens: f64,
    /// Last time tokens were refilled (token bucket only).
    last_refill: Option<Instant>,
    /// Total time spent waiting, for the end-of-batch summary.
    total_waited: Duration,
}

impl Pacer {
    /// Creates a pacer for the given policy.
    #[must_use]
    #[instrument]
    pub fn new(policy: PacingPolicy) -> Self {
        debug!("creating pacer");
        let tokens = match policy {
            PacingPolicy::TokenBucket { burst, .. } => f64::from(burst.max(1)),
            PacingPolicy::None | PacingPolicy::Fixed(_) => 0.0,
        };
        Self {
            policy,
            state: Mutex::new(PacerState {
                last_request: None,
                last_completed: None,
                tokens,
                last_refill: None,
                total_waited: Duration::ZERO,
            }),
        }
    }

    /// Creates a pacer that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(PacingPolicy::None)
    }

    /// Returns the configured policy.
    #[must_use]
    pub fn policy(&self) -> PacingPolicy {
        self.policy
    }

    /// Total time this pacer has spent waiting so far.
    pub async fn total_waited(&self) -> Duration {
        self.state.lock().await.total_waited
    }

    /// Waits until the policy allows the next request, then records it.
    ///
    /// The first call never waits. Under [`PacingPolicy::Fixed`] the delay is
    /// measured from the later of the previous request start and the last
    /// [`Pacer::complete`] call.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        let delay = match self.policy {
            PacingPolicy::None => Duration::ZERO,
            PacingPolicy::Fixed(gap) => state
                .last_request
                .max(state.last_completed)
                .map_or(Duration::ZERO, |last| gap.saturating_sub(last.elapsed())),
            PacingPolicy::TokenBucket {
                rate_per_sec,
                burst,
            } => state.take_token(rate_per_sec, burst),
        };

        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis(), "pacing before next request");
            state.total_waited += delay;
            tokio::time::sleep(delay).await;
        }

        state.last_request = Some(Instant::now());
    }

    /// Records that the current request has finished, successfully or not.
    pub async fn complete(&self) {
        self.state.lock().await.last_completed = Some(Instant::now());
    }
}

impl PacerState {
    /// Consumes one token, returning how long to wait for it to become available.
    fn take_token(&mut self, rate_per_sec: f64, burst: u32) -> Duration {
        let capacity = f64::from(burst.max(1));
        let now = Instant::now();
        if let Some(last_refill) = self.last_refill {
            let refilled = now.duration_since(last_refill).as_secs_f64() * rate_per_sec;
            self.tokens = (self.tokens + refilled).min(capacity);
        }
        self.last_refill = Some(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return Duration::ZERO;
        }
        if rate_per_sec <= 0.0 {
            return Duration::ZERO;
        }

        let wait = Duration::from_secs_f64((1.0 - self.tokens) / rate_per_sec);
        // The token that accrues during the wait is spent on this request.
        self.tokens = 0.0;
        self.last_refill = Some(now + wait);
        wait
    }
}
