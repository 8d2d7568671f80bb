//! Questionnaire submission model

use crate::models::FormRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress state of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Answers saved but not submitted
    Draft,
    /// Final answers submitted
    Submitted,
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Draft => write!(f, "draft"),
            SubmissionStatus::Submitted => write!(f, "submitted"),
        }
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(SubmissionStatus::Draft),
            "submitted" => Ok(SubmissionStatus::Submitted),
            _ => Err(()),
        }
    }
}

/// A questionnaire answer set, keyed by `(company_id, role)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub company_id: String,
    pub role: FormRole,
    /// One entry per question, in schema order
    pub answers: Vec<String>,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Count of non-empty answers, the completeness measure used by finalize.
    pub fn filled_count(&self) -> usize {
        self.answers.iter().filter(|a| !a.trim().is_empty()).count()
    }

    /// Whether the answer set meets the track's expected question count.
    pub fn is_complete(&self) -> bool {
        self.filled_count() >= self.role.question_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(role: FormRole, answers: Vec<String>) -> Submission {
        let now = Utc::now();
        Submission {
            company_id: "acme".to_string(),
            role,
            answers,
            status: SubmissionStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_filled_count_skips_blank_answers() {
        let s = submission(
            FormRole::Commercial,
            vec!["a".to_string(), "  ".to_string(), "".to_string(), "b".to_string()],
        );
        assert_eq!(s.filled_count(), 2);
    }

    #[test]
    fn test_completeness_threshold() {
        let full = submission(FormRole::Commercial, vec!["x".to_string(); 27]);
        assert!(full.is_complete());

        let short = submission(FormRole::Commercial, vec!["x".to_string(); 20]);
        assert!(!short.is_complete());

        let mut padded = submission(FormRole::Commercial, vec!["x".to_string(); 27]);
        padded.answers[3] = String::new();
        assert!(!padded.is_complete());
    }
}
