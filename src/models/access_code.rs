//! Access code model

use crate::models::FormRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An opaque credential mapping to a role and tenant.
///
/// Codes are created and deactivated by an external registration process;
/// this system only performs equality lookups against active codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessCode {
    /// The alphanumeric code itself (unique)
    pub code: String,
    /// Track the code grants access to
    pub role: FormRole,
    /// Owning tenant
    pub company_id: String,
    /// Inactive codes are never matched
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
