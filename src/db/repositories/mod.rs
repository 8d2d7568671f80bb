//! Repository layer
//!
//! Data access for the onboarding tables. Each repository is a trait plus a
//! `Sqlx*Repository` implementation that works against both SQLite and MySQL.

pub mod access_code;
pub mod company;
pub mod contact;
pub mod rate_limit;
pub mod submission;

pub use access_code::{AccessCodeRepository, SqlxAccessCodeRepository};
pub use company::{CompanyRepository, SqlxCompanyRepository};
pub use contact::{ContactRepository, SqlxContactRepository};
pub use rate_limit::{RateLimitRepository, SqlxRateLimitRepository};
pub use submission::{SqlxSubmissionRepository, SubmissionRepository};
