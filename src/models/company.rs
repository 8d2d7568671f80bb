//! Company (tenant) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The organizational unit that owns a pair of questionnaire submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    /// Recipient address for the generated proposal
    pub email: String,
    pub created_at: DateTime<Utc>,
}
