//! Rate limiter for access attempts
//!
//! Fixed-window attempt counter keyed by client identifier (IP address, or
//! the "unknown-ip" sentinel), backed by the persistent `rate_limits` table
//! so limits survive process restarts.
//!
//! The limiter fails open: if the backing store errors, the request is
//! admitted and the error is logged, so a storage outage never locks out
//! legitimate traffic. Session verification is the fail-closed side of that
//! trade-off.
//!
//! There is no compare-and-swap around the read-modify-write, so concurrent
//! admits for the same identifier can both observe the pre-update state and
//! overrun the limit slightly.

use crate::db::repositories::RateLimitRepository;
use crate::models::RateLimitEntry;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;

/// A per-endpoint rate limit: `limit` attempts per `window_ms` milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct LimitPolicy {
    pub limit: i64,
    pub window_ms: i64,
}

impl LimitPolicy {
    pub const fn per_minute(limit: i64) -> Self {
        Self {
            limit,
            window_ms: 60_000,
        }
    }
}

/// Code verification: 5 attempts per minute per IP.
pub const VERIFY_CODE_POLICY: LimitPolicy = LimitPolicy::per_minute(5);

/// Contact request submission: 2 attempts per minute per IP.
pub const CONTACT_POLICY: LimitPolicy = LimitPolicy::per_minute(2);

/// Onboarding data endpoint: 20 requests per minute per IP.
pub const ONBOARDING_POLICY: LimitPolicy = LimitPolicy::per_minute(20);

/// Persistent fixed-window rate limiter
pub struct RateLimiter {
    repo: Arc<dyn RateLimitRepository>,
}

impl RateLimiter {
    pub fn new(repo: Arc<dyn RateLimitRepository>) -> Self {
        Self { repo }
    }

    /// Check `identifier` against `policy` and record the attempt.
    ///
    /// Returns `true` if the request is admitted, `false` if the identifier
    /// has exhausted its window. Rejected attempts do not touch stored state.
    /// Storage errors admit the request (fail open).
    pub async fn admit(&self, identifier: &str, policy: LimitPolicy) -> bool {
        match self.try_admit(identifier, policy).await {
            Ok(admitted) => admitted,
            Err(e) => {
                tracing::warn!("Rate limiter storage error, admitting {}: {}", identifier, e);
                true
            }
        }
    }

    async fn try_admit(&self, identifier: &str, policy: LimitPolicy) -> Result<bool> {
        let now = Utc::now();

        let entry = match self.repo.get(identifier).await? {
            None => RateLimitEntry::fresh(identifier, now),
            Some(existing) if existing.window_expired(now, policy.window_ms) => {
                RateLimitEntry::fresh(identifier, now)
            }
            Some(existing) => {
                if existing.attempts >= policy.limit {
                    return Ok(false);
                }
                RateLimitEntry {
                    identifier: existing.identifier,
                    attempts: existing.attempts + 1,
                    last_attempt: now,
                }
            }
        };

        self.repo.put(&entry).await?;
        Ok(true)
    }
}
