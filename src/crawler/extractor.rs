//! Selector-driven record extraction
//!
//! A site's selector map is compiled once into an [`ExtractionPlan`] and
//! shared by every worker. Documents are parsed and queried synchronously;
//! `scraper::Html` never crosses an await point.

use crate::config::{FieldKind, SiteConfig};
use crate::crawler::parser::{element_text, image_source, meta_description, resolve_link, select_links};
use crate::output::{ExtractedRecord, FieldValue};
use crate::ConfigError;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use url::Url;

static PRICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("price pattern is valid"));

/// One compiled record field
#[derive(Debug, Clone)]
struct FieldPlan {
    name: String,
    selector: Selector,
    kind: FieldKind,
}

/// Links found on a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingLinks {
    pub detail_links: Vec<String>,
    pub pagination_links: Vec<String>,
}

/// Compiled selectors for one site
#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    link: Option<Selector>,
    pagination: Option<Selector>,
    fields: Vec<FieldPlan>,
    strip_image_query: bool,
}

impl ExtractionPlan {
    /// Compiles every selector of a site descriptor
    pub fn compile(site: &SiteConfig) -> Result<Self, ConfigError> {
        let parse = |field: &str, css: &str| {
            Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
                field: format!("{}.{}", site.name, field),
                message: e.to_string(),
            })
        };

        let link = site
            .link_selector()
            .map(|css| parse("link", css))
            .transpose()?;
        let pagination = site
            .pagination_selector()
            .map(|css| parse("pagination", css))
            .transpose()?;

        let fields = site
            .record_fields()
            .map(|(name, spec)| {
                Ok(FieldPlan {
                    name: name.clone(),
                    selector: parse(name, spec.selector())?,
                    kind: spec.kind(name),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            link,
            pagination,
            fields,
            strip_image_query: site.strip_image_query,
        })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    /// Extracts one record from a detail page
    ///
    /// Never fails: a field whose selector matches nothing is null.
    pub fn extract_record(&self, html: &str, page_url: &str) -> ExtractedRecord {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url).ok();

        let fields: BTreeMap<String, Option<FieldValue>> = self
            .fields
            .iter()
            .map(|field| {
                (
                    field.name.clone(),
                    self.extract_field(&document, field, base.as_ref()),
                )
            })
            .collect();

        ExtractedRecord::new(page_url, fields)
    }

    /// Extracts detail and pagination links from a listing page
    pub fn extract_listing(&self, html: &str, page_url: &str) -> ListingLinks {
        let Ok(base) = Url::parse(page_url) else {
            tracing::warn!("Cannot resolve links on unparseable page URL {}", page_url);
            return ListingLinks::default();
        };
        let document = Html::parse_document(html);

        let links = |selector: &Option<Selector>| {
            selector
                .as_ref()
                .map(|selector| select_links(&document, selector, &base))
                .unwrap_or_default()
        };

        ListingLinks {
            detail_links: links(&self.link),
            pagination_links: links(&self.pagination),
        }
    }

    fn extract_field(
        &self,
        document: &Html,
        field: &FieldPlan,
        base: Option<&Url>,
    ) -> Option<FieldValue> {
        let first_text = || {
            document
                .select(&field.selector)
                .next()
                .map(|element| element_text(&element))
        };

        match field.kind {
            FieldKind::Text => first_text().and_then(|text| FieldValue::text(first_line(&text))),
            FieldKind::Price => first_text()
                .and_then(|text| parse_price(&text))
                .and_then(FieldValue::text),
            FieldKind::Description => first_text()
                .and_then(|text| FieldValue::text(first_line(&text)))
                .or_else(|| meta_description(document).and_then(FieldValue::text)),
            FieldKind::List => FieldValue::list(
                document
                    .select(&field.selector)
                    .map(|element| element_text(&element))
                    .filter(|text| !text.is_empty())
                    .collect(),
            ),
            FieldKind::Images => FieldValue::list(
                document
                    .select(&field.selector)
                    .filter_map(|element| image_source(&element))
                    .filter_map(|src| self.absolute_image(&src, base))
                    .collect(),
            ),
        }
    }

    fn absolute_image(&self, src: &str, base: Option<&Url>) -> Option<String> {
        let resolved = match base {
            Some(base) => resolve_link(src, base)?,
            None => src.to_string(),
        };

        if !self.strip_image_query {
            return Some(resolved);
        }
        match Url::parse(&resolved) {
            Ok(mut url) => {
                url.set_query(None);
                url.set_fragment(None);
                Some(url.to_string())
            }
            Err(_) => Some(resolved),
        }
    }
}

/// Text up to the first line break, trimmed
fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}

/// First numeric substring with thousands separators removed
pub fn parse_price(text: &str) -> Option<String> {
    PRICE_PATTERN
        .find(text)
        .map(|m| m.as_str().replace(',', ""))
}
