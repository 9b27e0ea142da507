use percent_encoding::percent_decode_str;
use url::Url;

/// Longest file stem produced for a record file
const MAX_SLUG_LEN: usize = 120;

/// Derives a file-safe slug from the last non-empty segment of a URL path
///
/// Characters outside `[A-Za-z0-9_-]` are dropped and whitespace becomes
/// `_`. A URL without a usable path segment falls back to its host, then
/// to `index`.
///
/// # Examples
///
/// ```
/// use pantry_scout::url::path_slug;
///
/// assert_eq!(path_slug("https://shop.test/products/10-inch-skillet"), "10-inch-skillet");
/// assert_eq!(path_slug("https://shop.test/products/pan.html?v=2"), "panhtml");
/// ```
pub fn path_slug(url: &str) -> String {
    let parsed = Url::parse(url).ok();

    let segment = parsed
        .as_ref()
        .and_then(|u| u.path_segments())
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(decode_segment);

    let candidate = segment
        .map(|s| sanitize(&s))
        .filter(|s| !s.is_empty())
        .or_else(|| {
            parsed
                .as_ref()
                .and_then(|u| u.host_str())
                .map(sanitize)
                .filter(|s| !s.is_empty())
        });

    candidate.unwrap_or_else(|| "index".to_string())
}

/// Percent-decodes a path segment; `+` and `=` are literal in paths
fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

fn sanitize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .take(MAX_SLUG_LEN)
        .collect()
}
