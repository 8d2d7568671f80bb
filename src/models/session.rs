//! Session token claims

use crate::models::FormRole;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried inside the signed session token.
///
/// The token is client-held; nothing is stored server-side. Validity requires
/// the signature to verify, the current time to be before `exp`, and the
/// presenting request's IP and user-agent to equal the bound values exactly
/// (that last check is done by the request gate, not the verifier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Tenant the session belongs to
    pub company_id: String,
    /// Track the session grants access to
    pub role: FormRole,
    /// Client IP captured at issuance
    pub ip: String,
    /// Client user-agent captured at issuance
    #[serde(rename = "userAgent")]
    pub user_agent: String,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds (issuance + 15 minutes, never refreshed)
    pub exp: i64,
}

impl SessionClaims {
    /// Check if the session has expired
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() < now
    }

    /// Absolute expiry timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }

    /// Whether the presenting request's fingerprint matches the one bound at
    /// issuance. Exact string equality, not fuzzy.
    pub fn fingerprint_matches(&self, ip: &str, user_agent: &str) -> bool {
        self.ip == ip && self.user_agent == user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp_offset_secs: i64) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims {
            company_id: "acme".to_string(),
            role: FormRole::Commercial,
            ip: "10.0.0.1".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            iat: now,
            exp: now + exp_offset_secs,
        }
    }

    #[test]
    fn test_expiry_check() {
        assert!(!claims(900).is_expired(Utc::now()));
        assert!(claims(-1).is_expired(Utc::now()));
    }

    #[test]
    fn test_fingerprint_exact_match() {
        let c = claims(900);
        assert!(c.fingerprint_matches("10.0.0.1", "Mozilla/5.0"));
        assert!(!c.fingerprint_matches("10.0.0.2", "Mozilla/5.0"));
        assert!(!c.fingerprint_matches("10.0.0.1", "mozilla/5.0"));
    }
}
