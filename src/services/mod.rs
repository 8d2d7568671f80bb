//! Services layer - Business logic
//!
//! This module contains all business logic services for the Alta onboarding
//! system. Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories and external collaborators
//! - Handling validation and error cases

pub mod access_code;
pub mod email;
pub mod proposal;
pub mod rate_limiter;
pub mod sanitize;
pub mod session;
pub mod submission;

pub use access_code::{AccessCodeError, AccessCodeService, Grant};
pub use email::{Mailer, SmtpMailer};
pub use proposal::{HttpProposalBackend, ProfileEvaluation, ProposalBackend, ProposalDocument};
pub use rate_limiter::{LimitPolicy, RateLimiter, CONTACT_POLICY, ONBOARDING_POLICY, VERIFY_CODE_POLICY};
pub use sanitize::{sanitize_answer, sanitize_answers, MAX_ANSWER_LEN};
pub use session::{SessionError, SessionService, SESSION_COOKIE, SESSION_TTL_SECS};
pub use submission::{SubmissionError, SubmissionService};
