//! Configuration module for Pantry-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use pantry_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Detail workers per listing page: {}", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    is_reserved_key, Config, CrawlerConfig, DelayRange, FieldKind, FieldSpec, IngestConfig,
    LedgerBackend, OutputConfig, RetryConfig, SiteConfig, LINK_KEYS, MAX_DELAY_SECS, PAGINATION_KEY,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
