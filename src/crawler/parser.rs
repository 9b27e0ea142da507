//! HTML helpers shared by listing and detail page handling
//!
//! This module handles:
//! - Resolving hrefs and image sources to absolute URLs
//! - Collecting links matched by a configured selector
//! - Reading element text and the meta description

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Collects the hrefs of every element matched by `selector`
///
/// Links are resolved against `page_url`, deduplicated and returned in
/// document order. Matches without a usable href are skipped.
pub fn select_links(document: &Html, selector: &Selector, page_url: &Url) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();

    for element in document.select(selector) {
        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, page_url) {
                if !links.contains(&absolute_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Same page anchors
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Image source of an element: `src`, falling back to lazy-load `data-src`
pub fn image_source(element: &ElementRef<'_>) -> Option<String> {
    let value = element.value();
    [value.attr("src"), value.attr("data-src")]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(str::to_string)
}

/// Whitespace-trimmed text content of an element
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Content of `<meta name="description">`, if present and non-blank
pub fn meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
}
