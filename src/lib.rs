//! Alta - onboarding backend for the commercial/technical questionnaire tracks
//!
//! This library provides the core functionality for the Alta onboarding system.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
