//! Domain models for the Alta onboarding system

pub mod access_code;
pub mod company;
pub mod contact;
pub mod rate_limit;
pub mod role;
pub mod session;
pub mod submission;

pub use access_code::AccessCode;
pub use company::Company;
pub use contact::ContactRequest;
pub use rate_limit::RateLimitEntry;
pub use role::FormRole;
pub use session::SessionClaims;
pub use submission::{Submission, SubmissionStatus};
