//! Configuration management
//!
//! This module handles loading and parsing configuration for the Alta
//! onboarding system. Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults. The session
//! signing secret has no default: it must be provided and at least 32 bytes
//! long, and the check runs at load time so a misconfigured deployment fails
//! before it can mint a single token.

use serde::{Deserialize, Serialize};

/// Minimum length of the session signing secret, in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// SMTP configuration for proposal emails
    #[serde(default)]
    pub smtp: SmtpConfig,
    /// External evaluation/proposal services
    #[serde(default)]
    pub services: ServicesConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/alta.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HMAC signing secret, must be at least 32 bytes
    #[serde(default)]
    pub secret: String,
    /// Mark the session cookie as Secure (set in production)
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            secure_cookie: false,
        }
    }
}

/// SMTP configuration for outbound email
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SmtpConfig {
    /// SMTP relay host; empty disables email sending
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// From address for proposal emails
    #[serde(default)]
    pub from: String,
    /// Display name for the From header
    #[serde(default = "default_smtp_from_name")]
    pub from_name: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from_name() -> String {
    "Alta".to_string()
}

/// External service endpoints used by the finalize pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Profile evaluation service base URL
    #[serde(default = "default_evaluation_url")]
    pub evaluation_url: String,
    /// Proposal generation service base URL
    #[serde(default = "default_proposal_url")]
    pub proposal_url: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            evaluation_url: default_evaluation_url(),
            proposal_url: default_proposal_url(),
        }
    }
}

fn default_evaluation_url() -> String {
    "http://localhost:9100".to_string()
}

fn default_proposal_url() -> String {
    "http://localhost:9200".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - ALTA_SERVER_HOST
    /// - ALTA_SERVER_PORT
    /// - ALTA_SERVER_CORS_ORIGIN
    /// - ALTA_DATABASE_DRIVER
    /// - ALTA_DATABASE_URL
    /// - ALTA_SESSION_SECRET
    /// - ALTA_SESSION_SECURE_COOKIE
    /// - ALTA_SMTP_HOST / PORT / USERNAME / PASSWORD / FROM
    /// - ALTA_EVALUATION_URL
    /// - ALTA_PROPOSAL_URL
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("ALTA_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("ALTA_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("ALTA_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("ALTA_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("ALTA_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(secret) = std::env::var("ALTA_SESSION_SECRET") {
            self.session.secret = secret;
        }
        if let Ok(secure) = std::env::var("ALTA_SESSION_SECURE_COOKIE") {
            self.session.secure_cookie = secure == "true" || secure == "1";
        }

        if let Ok(host) = std::env::var("ALTA_SMTP_HOST") {
            self.smtp.host = host;
        }
        if let Ok(port) = std::env::var("ALTA_SMTP_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.smtp.port = port;
            }
        }
        if let Ok(username) = std::env::var("ALTA_SMTP_USERNAME") {
            self.smtp.username = username;
        }
        if let Ok(password) = std::env::var("ALTA_SMTP_PASSWORD") {
            self.smtp.password = password;
        }
        if let Ok(from) = std::env::var("ALTA_SMTP_FROM") {
            self.smtp.from = from;
        }

        if let Ok(url) = std::env::var("ALTA_EVALUATION_URL") {
            self.services.evaluation_url = url;
        }
        if let Ok(url) = std::env::var("ALTA_PROPOSAL_URL") {
            self.services.proposal_url = url;
        }
    }

    /// Validate the configuration.
    ///
    /// The session secret is required and must be at least 32 bytes. This is
    /// checked once at startup; the token signer trusts the secret after
    /// this point.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::ValidationError(format!(
                "session secret must be at least {} bytes, got {}",
                MIN_SESSION_SECRET_LEN,
                self.session.secret.len()
            )));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}
