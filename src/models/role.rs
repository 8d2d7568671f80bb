//! Questionnaire track roles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two parallel questionnaire tracks. An access code grants exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormRole {
    /// Commercial track ("comercial")
    Commercial,
    /// Technical track ("técnico")
    Technical,
}

impl FormRole {
    /// Number of questions in this track's schema.
    pub fn question_count(&self) -> usize {
        match self {
            FormRole::Commercial => 27,
            FormRole::Technical => 33,
        }
    }

    /// Path prefix of the role-scoped pages for this track.
    pub fn route_prefix(&self) -> &'static str {
        match self {
            FormRole::Commercial => "/comercial",
            FormRole::Technical => "/tecnico",
        }
    }
}

impl fmt::Display for FormRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormRole::Commercial => write!(f, "commercial"),
            FormRole::Technical => write!(f, "technical"),
        }
    }
}

impl FromStr for FormRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commercial" => Ok(FormRole::Commercial),
            "technical" => Ok(FormRole::Technical),
            _ => Err(()),
        }
    }
}
