//! Contact request model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An inbound contact request from the public landing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRequest {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
