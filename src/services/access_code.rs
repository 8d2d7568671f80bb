//! Access code verification
//!
//! Resolves a raw access code to a `(role, company)` grant. Malformed input,
//! unknown codes, deactivated codes, and codes bound to a different track
//! than the one requested all collapse into the same `InvalidCode` rejection,
//! so a caller cannot tell which condition it hit.

use crate::db::repositories::AccessCodeRepository;
use crate::models::FormRole;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

/// The identity resolved from a valid access code.
#[derive(Debug, Clone, PartialEq)]
pub struct Grant {
    pub role: FormRole,
    pub company_id: String,
}

/// Error types for access code verification
#[derive(Debug, thiserror::Error)]
pub enum AccessCodeError {
    /// Constant-shape rejection for every non-matching input
    #[error("Código inválido")]
    InvalidCode,

    /// Storage failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Access code verification service
pub struct AccessCodeService {
    codes: Arc<dyn AccessCodeRepository>,
}

impl AccessCodeService {
    pub fn new(codes: Arc<dyn AccessCodeRepository>) -> Self {
        Self { codes }
    }

    /// Verify a raw code for the requested track.
    ///
    /// The code is trimmed and must be alphanumeric; anything else is
    /// rejected before the lookup. The caller is responsible for running the
    /// rate limiter first; limiter rejection takes precedence over this
    /// check.
    pub async fn verify(
        &self,
        raw_code: &str,
        requested_role: FormRole,
    ) -> Result<Grant, AccessCodeError> {
        let code = raw_code.trim();
        if code.is_empty() || !CODE_RE.is_match(code) {
            return Err(AccessCodeError::InvalidCode);
        }

        let record = self
            .codes
            .find_active(code)
            .await?
            .ok_or(AccessCodeError::InvalidCode)?;

        if record.role != requested_role {
            return Err(AccessCodeError::InvalidCode);
        }

        Ok(Grant {
            role: record.role,
            company_id: record.company_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::access_code::tests::{seed_code, seed_company, setup_pool};
    use crate::db::repositories::SqlxAccessCodeRepository;
    use proptest::prelude::*;

    async fn service() -> AccessCodeService {
        let pool = setup_pool().await;
        seed_company(&pool, "acme").await;
        seed_code(&pool, "ABC123", "commercial", "acme", true).await;
        seed_code(&pool, "TEC777", "technical", "acme", true).await;
        seed_code(&pool, "MUERTO1", "commercial", "acme", false).await;
        AccessCodeService::new(Arc::new(SqlxAccessCodeRepository::new(pool)))
    }

    #[tokio::test]
    async fn test_valid_code_resolves_grant() {
        let svc = service().await;
        let grant = svc
            .verify("ABC123", FormRole::Commercial)
            .await
            .expect("Valid code should verify");
        assert_eq!(grant.role, FormRole::Commercial);
        assert_eq!(grant.company_id, "acme");
    }

    #[tokio::test]
    async fn test_code_is_trimmed_before_lookup() {
        let svc = service().await;
        assert!(svc.verify("  ABC123  ", FormRole::Commercial).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejections_share_one_shape() {
        let svc = service().await;

        // malformed, unknown, inactive, wrong-track: all the same variant
        for (code, role) in [
            ("", FormRole::Commercial),
            ("   ", FormRole::Commercial),
            ("abc-123", FormRole::Commercial),
            ("ABC 123", FormRole::Commercial),
            ("ábc123", FormRole::Commercial),
            ("NOEXISTE", FormRole::Commercial),
            ("MUERTO1", FormRole::Commercial),
            ("ABC123", FormRole::Technical),
            ("TEC777", FormRole::Commercial),
        ] {
            let err = svc.verify(code, role).await.expect_err("must reject");
            assert!(
                matches!(err, AccessCodeError::InvalidCode),
                "code {:?} should yield InvalidCode",
                code
            );
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(30))]

        #[test]
        fn property_non_alphanumeric_never_passes_pattern(code in "[^A-Za-z0-9]{1,20}") {
            prop_assert!(!super::CODE_RE.is_match(&code));
        }

        #[test]
        fn property_alphanumeric_passes_pattern(code in "[A-Za-z0-9]{1,20}") {
            prop_assert!(super::CODE_RE.is_match(&code));
        }
    }
}
