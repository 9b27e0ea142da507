//! URL handling module for Pantry-Scout
//!
//! This module provides visited-set normalization, record file slugs and
//! the path heuristic that tells detail pages from listing pages.

mod normalize;
mod slug;

// Re-export main functions
pub use normalize::normalize_url;
pub use slug::path_slug;

/// Returns true when the URL path contains one of the detail markers
///
/// Markers are path fragments such as `/products/` or `/recipes/`. Only
/// the path is inspected, so a marker inside a query string does not count.
///
/// # Examples
///
/// ```
/// use pantry_scout::url::is_detail_url;
///
/// let markers = vec!["/products/".to_string()];
/// assert!(is_detail_url("https://shop.test/products/pan", &markers));
/// assert!(!is_detail_url("https://shop.test/collections/all", &markers));
/// ```
pub fn is_detail_url(url: &str, markers: &[String]) -> bool {
    let path = ::url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());

    markers
        .iter()
        .filter(|marker| !marker.is_empty())
        .any(|marker| path.contains(marker.as_str()))
}
