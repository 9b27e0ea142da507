use rand::Rng;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Selector keys that locate detail-page links on a listing page
pub const LINK_KEYS: &[&str] = &["link", "product_link"];

/// Selector key that locates pagination links on a listing page
pub const PAGINATION_KEY: &str = "pagination";

/// Main configuration structure for Pantry-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(rename = "site", default)]
    pub sites: Vec<SiteConfig>,
}

impl Config {
    /// Looks up a site descriptor by name
    pub fn site(&self, name: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| site.name == name)
    }
}

/// Fetching and worker-pool behavior shared by every site
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of detail pages fetched concurrently per listing page
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Attempts per URL before the fetch is reported as failed
    #[serde(rename = "fetch-retries", default = "default_fetch_retries")]
    pub fetch_retries: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Sleep range between failed attempts (seconds)
    #[serde(rename = "retry-delay", default = "default_retry_delay")]
    pub retry_delay: DelayRange,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            fetch_retries: default_fetch_retries(),
            request_timeout_secs: default_timeout(),
            retry_delay: default_retry_delay(),
        }
    }
}

/// Retry-wave configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Extra cycles run after the first one while URLs keep failing
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
        }
    }
}

/// Where results, ledgers and summaries land
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory; records go to `<records-dir>/<category>/`
    #[serde(rename = "records-dir")]
    pub records_dir: String,

    /// Root directory (or database parent) for retry ledgers
    #[serde(rename = "ledger-dir")]
    pub ledger_dir: String,

    #[serde(rename = "ledger-backend", default)]
    pub ledger_backend: LedgerBackend,

    /// Optional markdown run summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// Persistence backend for the retry ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    #[default]
    Json,
    Sqlite,
}

/// Chunk export settings for the vector-store ingestion job
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(rename = "chunk-chars", default = "default_chunk_chars")]
    pub chunk_chars: usize,

    #[serde(rename = "overlap-chars", default = "default_overlap_chars")]
    pub overlap_chars: usize,

    #[serde(rename = "output-path", default = "default_chunk_output")]
    pub output_path: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_chars: default_chunk_chars(),
            overlap_chars: default_overlap_chars(),
            output_path: default_chunk_output(),
        }
    }
}

/// Per-site crawl descriptor
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Unique site name, also used for ledger and aggregate file names
    pub name: String,

    /// Output directory name for record files (defaults to `name`)
    #[serde(default)]
    pub category: Option<String>,

    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Deepest listing page followed through pagination (1 = start page only)
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Politeness sleep after each detail page (seconds)
    #[serde(rename = "delay-range", default = "default_delay_range")]
    pub delay_range: DelayRange,

    #[serde(default)]
    pub seeds: Vec<String>,

    /// URL path fragments that mark a detail page
    #[serde(rename = "detail-markers", default = "default_detail_markers")]
    pub detail_markers: Vec<String>,

    /// Vector-store collection for exported chunks (defaults to `name`)
    #[serde(default)]
    pub collection: Option<String>,

    #[serde(rename = "strip-image-query", default)]
    pub strip_image_query: bool,

    pub selectors: BTreeMap<String, FieldSpec>,
}

impl SiteConfig {
    pub fn category_dir(&self) -> &str {
        self.category.as_deref().unwrap_or(&self.name)
    }

    pub fn collection_name(&self) -> &str {
        self.collection.as_deref().unwrap_or(&self.name)
    }

    /// Selector for detail links on a listing page
    pub fn link_selector(&self) -> Option<&str> {
        LINK_KEYS
            .iter()
            .find_map(|key| self.selectors.get(*key))
            .map(FieldSpec::selector)
    }

    /// Selector for pagination links on a listing page
    pub fn pagination_selector(&self) -> Option<&str> {
        self.selectors.get(PAGINATION_KEY).map(FieldSpec::selector)
    }

    /// Record fields, i.e. every selector that is not structural
    pub fn record_fields(&self) -> impl Iterator<Item = (&String, &FieldSpec)> {
        self.selectors
            .iter()
            .filter(|(field, _)| !is_reserved_key(field))
    }
}

/// Returns true for selector keys that drive navigation rather than records
pub fn is_reserved_key(key: &str) -> bool {
    LINK_KEYS.contains(&key) || key == PAGINATION_KEY
}

/// A selector, either bare or annotated with its field kind
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Selector(String),
    Typed {
        selector: String,
        #[serde(default)]
        kind: Option<FieldKind>,
    },
}

impl FieldSpec {
    pub fn selector(&self) -> &str {
        match self {
            Self::Selector(selector) | Self::Typed { selector, .. } => selector,
        }
    }

    /// Kind of the field named `field`
    ///
    /// An explicit `kind` wins; otherwise the kind follows the field name.
    pub fn kind(&self, field: &str) -> FieldKind {
        match self {
            Self::Typed {
                kind: Some(kind), ..
            } => *kind,
            _ => FieldKind::for_field(field),
        }
    }
}

/// How a matched element is normalized into a field value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// First match, trimmed, cut at the first newline
    #[default]
    Text,
    /// First numeric substring of the first match
    Price,
    /// Every match's image source, as absolute URLs
    Images,
    /// Like `Text`, falling back to the meta description
    Description,
    /// Trimmed text of every match
    List,
}

impl FieldKind {
    /// Default kind for well-known field names
    pub fn for_field(field: &str) -> Self {
        match field {
            "price" => Self::Price,
            "images" => Self::Images,
            "description" => Self::Description,
            "ingredients" | "instructions" => Self::List,
            _ => Self::Text,
        }
    }
}

/// Longest sleep a delay range may ask for (seconds)
pub const MAX_DELAY_SECS: f64 = 3600.0;

/// Uniform sampling range in seconds
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f64; 2]")]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

impl DelayRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A range that never sleeps
    pub const fn none() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Draws a duration uniformly from the range
    ///
    /// The draw is clamped to `0..=MAX_DELAY_SECS`, so an unvalidated range
    /// never panics.
    pub fn sample(&self) -> Duration {
        let min = self.min.clamp(0.0, MAX_DELAY_SECS);
        let max = self.max.clamp(0.0, MAX_DELAY_SECS);
        let secs = if max > min {
            rand::rng().random_range(min..=max)
        } else {
            min
        };
        Duration::try_from_secs_f64(secs).unwrap_or_default()
    }
}

impl From<[f64; 2]> for DelayRange {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

fn default_workers() -> usize {
    5
}

fn default_fetch_retries() -> u32 {
    3
}

fn default_timeout() -> u64 {
    10
}

fn default_retry_delay() -> DelayRange {
    DelayRange::new(2.0, 5.0)
}

fn default_max_retries() -> u32 {
    2
}

fn default_chunk_chars() -> usize {
    1500
}

fn default_overlap_chars() -> usize {
    125
}

fn default_chunk_output() -> String {
    "./chunks.jsonl".to_string()
}

fn default_max_pages() -> u32 {
    5
}

fn default_delay_range() -> DelayRange {
    DelayRange::new(1.0, 3.0)
}

fn default_detail_markers() -> Vec<String> {
    vec!["/products/".to_string(), "/recipes/".to_string()]
}
