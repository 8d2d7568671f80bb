//! Session token issuance and verification
//!
//! Sessions are self-contained signed tokens, not server-side rows. A token
//! is `base64url(claims JSON) . base64url(HMAC-SHA256 tag)` over the encoded
//! claims, signed with a server-held secret of at least 32 bytes.
//!
//! Verification is fail closed: a missing part, an undecodable part, a bad
//! signature, a malformed payload, or an elapsed expiry all reject the token.
//! What verification deliberately does NOT do is compare the bound
//! fingerprint against the live request; that equality check belongs to the
//! request gate.
//!
//! Expiry is fixed at issuance + 15 minutes. There is no refresh: after the
//! window closes the client must verify a code again.

use crate::config::MIN_SESSION_SECRET_LEN;
use crate::models::{FormRole, SessionClaims};
use chrono::Utc;
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Fixed session lifetime in seconds (15 minutes).
pub const SESSION_TTL_SECS: i64 = 15 * 60;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "onboarding_session";

/// Error types for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The signing secret is shorter than the required minimum
    #[error("Session secret must be at least {MIN_SESSION_SECRET_LEN} bytes")]
    SecretTooShort,

    /// Token structure or encoding is wrong
    #[error("Malformed session token")]
    Malformed,

    /// Signature does not verify against the server secret
    #[error("Invalid session signature")]
    BadSignature,

    /// Token is past its expiry
    #[error("Session expired")]
    Expired,
}

/// Issues and verifies signed session tokens
pub struct SessionService {
    mac: HmacSha256,
}

impl SessionService {
    /// Create a session service from the configured secret.
    ///
    /// The secret length is validated again here even though config
    /// validation already enforces it, so a service constructed any other
    /// way cannot sign with a weak key.
    pub fn new(secret: &str) -> Result<Self, SessionError> {
        if secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(SessionError::SecretTooShort);
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| SessionError::SecretTooShort)?;
        Ok(Self { mac })
    }

    /// Mint a token bound to the resolved identity and client fingerprint.
    pub fn issue(
        &self,
        company_id: &str,
        role: FormRole,
        ip: &str,
        user_agent: &str,
    ) -> (String, SessionClaims) {
        let iat = Utc::now().timestamp();
        let claims = SessionClaims {
            company_id: company_id.to_string(),
            role,
            ip: ip.to_string(),
            user_agent: user_agent.to_string(),
            iat,
            exp: iat + SESSION_TTL_SECS,
        };
        (self.encode(&claims), claims)
    }

    /// Verify signature, shape, and expiry. Does not check the fingerprint.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let (payload_b64, sig_b64) = token.split_once('.').ok_or(SessionError::Malformed)?;

        let payload = BASE64URL_NOPAD
            .decode(payload_b64.as_bytes())
            .map_err(|_| SessionError::Malformed)?;
        let signature = BASE64URL_NOPAD
            .decode(sig_b64.as_bytes())
            .map_err(|_| SessionError::Malformed)?;

        let mut mac = self.mac.clone();
        mac.update(&payload);
        mac.verify_slice(&signature)
            .map_err(|_| SessionError::BadSignature)?;

        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| SessionError::Malformed)?;

        if claims.is_expired(Utc::now()) {
            return Err(SessionError::Expired);
        }

        Ok(claims)
    }

    /// Remaining lifetime of a token in seconds.
    ///
    /// Verifies signature and expiry like `verify`; the fingerprint is not
    /// re-checked here.
    pub fn remaining(&self, token: &str) -> Result<i64, SessionError> {
        let claims = self.verify(token)?;
        Ok((claims.exp - Utc::now().timestamp()).max(0))
    }

    fn encode(&self, claims: &SessionClaims) -> String {
        // serde_json cannot fail on this struct
        let payload = serde_json::to_vec(claims).unwrap_or_default();
        let mut mac = self.mac.clone();
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();

        format!(
            "{}.{}",
            BASE64URL_NOPAD.encode(&payload),
            BASE64URL_NOPAD.encode(&signature)
        )
    }

    #[cfg(test)]
    fn issue_with_iat(
        &self,
        company_id: &str,
        role: FormRole,
        ip: &str,
        user_agent: &str,
        iat: i64,
    ) -> String {
        let claims = SessionClaims {
            company_id: company_id.to_string(),
            role,
            ip: ip.to_string(),
            user_agent: user_agent.to_string(),
            iat,
            exp: iat + SESSION_TTL_SECS,
        };
        self.encode(&claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn service() -> SessionService {
        SessionService::new(SECRET).expect("32-byte secret")
    }

    #[test]
    fn test_rejects_short_secret() {
        assert!(matches!(
            SessionService::new("short"),
            Err(SessionError::SecretTooShort)
        ));
        assert!(matches!(
            SessionService::new(&"x".repeat(31)),
            Err(SessionError::SecretTooShort)
        ));
        assert!(SessionService::new(&"x".repeat(32)).is_ok());
    }

    #[test]
    fn test_issue_then_verify() {
        let svc = service();
        let (token, issued) = svc.issue("acme", FormRole::Commercial, "10.0.0.1", "Mozilla/5.0");

        let verified = svc.verify(&token).expect("Fresh token should verify");
        assert_eq!(verified, issued);
        assert_eq!(verified.exp - verified.iat, SESSION_TTL_SECS);
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = service();
        let token = svc.issue_with_iat(
            "acme",
            FormRole::Commercial,
            "10.0.0.1",
            "Mozilla/5.0",
            Utc::now().timestamp() - SESSION_TTL_SECS - 1,
        );
        assert!(matches!(svc.verify(&token), Err(SessionError::Expired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let svc = service();
        let other = SessionService::new(&"y".repeat(32)).unwrap();
        let (token, _) = svc.issue("acme", FormRole::Technical, "10.0.0.1", "UA");

        assert!(matches!(
            other.verify(&token),
            Err(SessionError::BadSignature)
        ));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let svc = service();
        for token in ["", "no-dot", "a.b.c", "!!!.???", "YWJj."] {
            assert!(svc.verify(token).is_err(), "token {:?} must fail", token);
        }
    }

    #[test]
    fn test_payload_swap_rejected() {
        let svc = service();
        let (t1, _) = svc.issue("acme", FormRole::Commercial, "10.0.0.1", "UA");
        let (t2, _) = svc.issue("globex", FormRole::Technical, "10.0.0.2", "UA");

        let (p1, _) = t1.split_once('.').unwrap();
        let (_, s2) = t2.split_once('.').unwrap();

        let spliced = format!("{}.{}", p1, s2);
        // p1 and p2 differ, so s2 cannot validate p1
        assert!(matches!(
            svc.verify(&spliced),
            Err(SessionError::BadSignature)
        ));
    }

    #[test]
    fn test_remaining_lifetime() {
        let svc = service();
        let (token, _) = svc.issue("acme", FormRole::Commercial, "ip", "ua");

        let remaining = svc.remaining(&token).expect("Fresh token");
        assert!(remaining > SESSION_TTL_SECS - 5 && remaining <= SESSION_TTL_SECS);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(30))]

        #[test]
        fn property_tampered_payload_never_verifies(flip in 0usize..100) {
            let svc = service();
            let (token, _) = svc.issue("acme", FormRole::Commercial, "10.0.0.1", "UA");
            let (payload, sig) = token.split_once('.').unwrap();

            let mut bytes = BASE64URL_NOPAD.decode(payload.as_bytes()).unwrap();
            let idx = flip % bytes.len();
            bytes[idx] ^= 0x01;
            let tampered = format!("{}.{}", BASE64URL_NOPAD.encode(&bytes), sig);

            prop_assert!(svc.verify(&tampered).is_err());
        }
    }
}
