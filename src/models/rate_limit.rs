//! Rate limit entry model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-identifier fixed-window attempt counter.
///
/// Rows are created on the first attempt from an identifier and updated on
/// every subsequent one. They are never pruned; a long-lived deployment
/// should add an external cleanup job for the `rate_limits` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitEntry {
    /// Client IP, or the "unknown-ip" sentinel when none could be extracted
    pub identifier: String,
    /// Attempts observed in the current window
    pub attempts: i64,
    /// Timestamp of the most recent attempt
    pub last_attempt: DateTime<Utc>,
}

impl RateLimitEntry {
    /// A fresh entry for the first attempt of a new window.
    pub fn fresh(identifier: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.into(),
            attempts: 1,
            last_attempt: now,
        }
    }

    /// Whether the window of `window_ms` starting at `last_attempt` has
    /// elapsed by `now`.
    pub fn window_expired(&self, now: DateTime<Utc>, window_ms: i64) -> bool {
        self.last_attempt < now - chrono::Duration::milliseconds(window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fresh_entry() {
        let now = Utc::now();
        let entry = RateLimitEntry::fresh("1.2.3.4", now);
        assert_eq!(entry.attempts, 1);
        assert_eq!(entry.last_attempt, now);
    }

    #[test]
    fn test_window_expired() {
        let now = Utc::now();
        let entry = RateLimitEntry {
            identifier: "1.2.3.4".to_string(),
            attempts: 3,
            last_attempt: now - Duration::milliseconds(61_000),
        };
        assert!(entry.window_expired(now, 60_000));
        assert!(!entry.window_expired(now, 120_000));
    }
}
