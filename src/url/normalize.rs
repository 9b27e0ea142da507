use crate::UrlError;
use url::Url;

/// Query parameters that never change which page is served
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "_pos", "_sid", "_ss"];

/// Normalizes a URL into the key used by the visited set
///
/// Two links that serve the same page should collapse to one key so the
/// crawl never fetches it twice and pagination cycles terminate.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Lowercase the host (done by the parser for HTTP(S))
/// 3. Remove the trailing slash (except for root /)
/// 4. Remove the fragment
/// 5. Remove tracking query parameters (`utm_*`, click ids)
/// 6. Sort remaining query parameters by key
///
/// Scheme and `www.` are left alone: they can change what the server
/// returns, and the key is also the URL that gets fetched.
///
/// # Examples
///
/// ```
/// use pantry_scout::url::normalize_url;
///
/// let url = normalize_url("https://Shop.Example.com/products/pan/?utm_source=x#reviews").unwrap();
/// assert_eq!(url.as_str(), "https://shop.example.com/products/pan");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort_by(|a, b| a.0.cmp(&b.0));

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
