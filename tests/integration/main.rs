//! Integration tests for the crawler and the retry waves
//!
//! These tests use wiremock to create mock HTTP servers and drive the full
//! fetch, extract and persist cycle end-to-end. Every delay is zero.

mod crawl_tests;
mod wave_tests;

use pantry_scout::config::{parse_config, Config};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a one-site configuration pointed at the mock server
pub fn test_config(server: &MockServer, dir: &Path, max_pages: u32, max_retries: u32) -> Config {
    let uri = server.uri();
    let toml = format!(
        r#"
[crawler]
workers = 3
fetch-retries = 3
request-timeout-secs = 5
retry-delay = [0.0, 0.0]

[retry]
max-retries = {max_retries}

[output]
records-dir = "{dir}/records"
ledger-dir = "{dir}/ledger"

[[site]]
name = "shop"
category = "ecommerce_sites"
base-url = "{uri}"
max-pages = {max_pages}
delay-range = [0.0, 0.0]
seeds = ["{uri}/collections/all"]
detail-markers = ["/products/"]

[site.selectors]
product_link = "a.product-link"
pagination = "a.next"
title = "h1.title"
price = "span.price"
"#,
        dir = dir.display(),
    );
    parse_config(&toml).expect("test config is valid")
}

pub fn listing_page(detail_paths: &[&str], next: Option<&str>) -> String {
    let mut html = String::from("<html><body><div class=\"grid\">");
    for path in detail_paths {
        html.push_str(&format!("<a class=\"product-link\" href=\"{}\">item</a>", path));
    }
    html.push_str("</div>");
    if let Some(next) = next {
        html.push_str(&format!("<a class=\"next\" href=\"{}\">Next</a>", next));
    }
    html.push_str("</body></html>");
    html
}

pub fn detail_page(title: &str, price: &str) -> String {
    format!(
        "<html><body><h1 class=\"title\">{}</h1><span class=\"price\">{}</span></body></html>",
        title, price
    )
}

/// Mounts a 200 response with `body` at `route`, expected `times` times
pub async fn mount_page(server: &MockServer, route: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(server)
        .await;
}
