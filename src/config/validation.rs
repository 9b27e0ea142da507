use crate::config::types::{
    Config, CrawlerConfig, DelayRange, IngestConfig, OutputConfig, SiteConfig, LINK_KEYS,
    MAX_DELAY_SECS,
};
use crate::ConfigError;
use crate::crawler::ExtractionPlan;
use crate::output::RESERVED_RECORD_KEYS;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    validate_ingest_config(&config.ingest)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.fetch_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch-retries must be >= 1, got {}",
            config.fetch_retries
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    validate_delay_range("retry-delay", &config.retry_delay)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.records_dir.is_empty() {
        return Err(ConfigError::Validation(
            "records-dir cannot be empty".to_string(),
        ));
    }

    if config.ledger_dir.is_empty() {
        return Err(ConfigError::Validation(
            "ledger-dir cannot be empty".to_string(),
        ));
    }

    if matches!(&config.summary_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "summary-path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_ingest_config(config: &IngestConfig) -> Result<(), ConfigError> {
    if config.chunk_chars == 0 {
        return Err(ConfigError::Validation(
            "chunk-chars must be >= 1".to_string(),
        ));
    }

    if config.overlap_chars >= config.chunk_chars {
        return Err(ConfigError::Validation(format!(
            "overlap-chars ({}) must be smaller than chunk-chars ({})",
            config.overlap_chars, config.chunk_chars
        )));
    }

    Ok(())
}

/// Validates every site descriptor
fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[site]] entry is required".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for site in sites {
        if !names.insert(site.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site name '{}'",
                site.name
            )));
        }
        validate_site(site)?;
    }

    Ok(())
}

fn validate_site(site: &SiteConfig) -> Result<(), ConfigError> {
    validate_name(&site.name)?;
    if let Some(category) = &site.category {
        validate_name(category)?;
    }

    validate_http_url(&site.base_url, "base-url")?;
    for seed in &site.seeds {
        validate_http_url(seed, "seed")?;
    }

    if site.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "site '{}': max-pages must be >= 1",
            site.name
        )));
    }

    validate_delay_range("delay-range", &site.delay_range)?;

    let link_keys: Vec<&str> = LINK_KEYS
        .iter()
        .copied()
        .filter(|key| site.selectors.contains_key(*key))
        .collect();
    if link_keys.len() > 1 {
        return Err(ConfigError::Validation(format!(
            "site '{}': selectors {} are alternatives; set only one",
            site.name,
            link_keys.join(" and ")
        )));
    }

    if site.record_fields().next().is_none() {
        return Err(ConfigError::Validation(format!(
            "site '{}' must define at least one record field selector",
            site.name
        )));
    }

    if let Some((field, _)) = site
        .record_fields()
        .find(|(field, _)| RESERVED_RECORD_KEYS.contains(&field.as_str()))
    {
        return Err(ConfigError::Validation(format!(
            "site '{}': field name '{}' is reserved",
            site.name, field
        )));
    }

    ExtractionPlan::compile(site)?;

    Ok(())
}

/// Names become directory and file names, so keep them path-safe
fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "site name and category cannot be empty".to_string(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "'{}' must contain only alphanumeric characters, hyphens and underscores",
            name
        )));
    }

    Ok(())
}

fn validate_http_url(raw: &str, what: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            what, raw
        )));
    }

    Ok(())
}

fn validate_delay_range(what: &str, range: &DelayRange) -> Result<(), ConfigError> {
    if !(range.min >= 0.0 && range.min <= range.max && range.max <= MAX_DELAY_SECS) {
        return Err(ConfigError::Validation(format!(
            "{} must satisfy 0 <= min <= max <= {}, got [{}, {}]",
            what, MAX_DELAY_SECS, range.min, range.max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("rachael-ray").is_ok());
        assert!(validate_name("recipes_sites").is_ok());

        assert!(validate_name("").is_err());
        assert!(validate_name("../etc").is_err());
        assert!(validate_name("with space").is_err());
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("https://example.com/shop", "seed").is_ok());
        assert!(validate_http_url("http://127.0.0.1:8080/", "seed").is_ok());

        assert!(validate_http_url("ftp://example.com", "seed").is_err());
        assert!(validate_http_url("not a url", "seed").is_err());
    }

    #[test]
    fn test_validate_delay_range() {
        assert!(validate_delay_range("d", &DelayRange::new(1.0, 3.0)).is_ok());
        assert!(validate_delay_range("d", &DelayRange::none()).is_ok());

        assert!(validate_delay_range("d", &DelayRange::new(3.0, 1.0)).is_err());
        assert!(validate_delay_range("d", &DelayRange::new(-1.0, 1.0)).is_err());
        assert!(validate_delay_range("d", &DelayRange::new(0.0, f64::NAN)).is_err());
        assert!(validate_delay_range("d", &DelayRange::new(0.0, f64::INFINITY)).is_err());
        assert!(validate_delay_range("d", &DelayRange::new(1e20, 1e20)).is_err());
    }

    #[test]
    fn test_oversized_delay_rejected_at_load() {
        let config = crate::config::parse_config(
            r#"
[output]
records-dir = "./out"
ledger-dir = "./ledger"

[[site]]
name = "shop"
base-url = "https://example.com"
delay-range = [1e20, 1e20]

[site.selectors]
title = "h1"
"#,
        );
        assert!(matches!(config, Err(ConfigError::Validation(ref m)) if m.contains("delay-range")));
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let config = crate::config::parse_config(
            r#"
[output]
records-dir = "./out"
ledger-dir = "./ledger"

[[site]]
name = "broken"
base-url = "https://example.com"

[site.selectors]
title = "h1[[["
"#,
        );
        assert!(matches!(
            config,
            Err(ConfigError::InvalidSelector { ref field, .. }) if field == "broken.title"
        ));
    }

    #[test]
    fn test_site_without_record_fields_rejected() {
        let config = crate::config::parse_config(
            r#"
[output]
records-dir = "./out"
ledger-dir = "./ledger"

[[site]]
name = "links-only"
base-url = "https://example.com"

[site.selectors]
link = "a.card"
"#,
        );
        assert!(matches!(config, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_reserved_field_name_rejected() {
        let config = crate::config::parse_config(
            r#"
[output]
records-dir = "./out"
ledger-dir = "./ledger"

[[site]]
name = "shop"
base-url = "https://example.com"

[site.selectors]
url = "a.canonical"
"#,
        );
        assert!(matches!(config, Err(ConfigError::Validation(ref m)) if m.contains("reserved")));
    }

    #[test]
    fn test_both_link_selectors_rejected() {
        let config = crate::config::parse_config(
            r#"
[output]
records-dir = "./out"
ledger-dir = "./ledger"

[[site]]
name = "shop"
base-url = "https://example.com"

[site.selectors]
link = "a.card"
product_link = "a.product-link"
title = "h1"
"#,
        );
        assert!(matches!(
            config,
            Err(ConfigError::Validation(ref m)) if m.contains("link and product_link")
        ));
    }

    #[test]
    fn test_no_sites_rejected() {
        let config = crate::config::parse_config(
            r#"
[output]
records-dir = "./out"
ledger-dir = "./ledger"
"#,
        );
        assert!(matches!(config, Err(ConfigError::Validation(_))));
    }
}
