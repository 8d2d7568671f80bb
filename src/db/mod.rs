//! Database layer
//!
//! Persistence for the onboarding system. Supports SQLite (default, for
//! single-binary deployment) and MySQL, selected by configuration. A
//! trait-based pool abstraction (`DatabasePool`) lets the repositories work
//! against either backend without knowing which one is active.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool};
