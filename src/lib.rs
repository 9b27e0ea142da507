//! Pantry-Scout: a selector-driven site harvester
//!
//! This crate crawls e-commerce and recipe websites, extracts structured
//! records from detail pages using per-site CSS selector maps, and drives
//! unreliable seed batches through retry waves with a persisted ledger.

pub mod config;
pub mod crawler;
pub mod ingest;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;
pub mod waves;

use thiserror::Error;

/// Main error type for Pantry-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Malformed payload in {origin}: {message}")]
    MalformedPayload { origin: String, message: String },

    #[error("Record for {url} has no non-null field")]
    EmptyRecord { url: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector for '{field}': {message}")]
    InvalidSelector { field: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Pantry-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, FieldKind, SiteConfig};
pub use crawler::{Crawler, Fetcher};
pub use output::{ExtractedRecord, FieldValue, RecordSink};
pub use state::{PageOutcome, VisitedSet};
pub use crate::url::{is_detail_url, normalize_url, path_slug};
pub use waves::{run_waves, RetryLedger, WaveOutcome, WavePolicy, WaveReport};
