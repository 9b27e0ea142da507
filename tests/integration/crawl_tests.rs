use crate::{detail_page, listing_page, mount_page, test_config};
use pantry_scout::crawler::Crawler;
use pantry_scout::output::{aggregate_path, flush, read_aggregate};
use pantry_scout::PageOutcome;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Arrival time of every request, by path
type ArrivalLog = Arc<Mutex<Vec<(String, Instant)>>>;

/// Responds with a fixed body after `delay`, logging when each request arrived
struct LoggedPage {
    log: ArrivalLog,
    body: String,
    delay: Duration,
}

impl Respond for LoggedPage {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.log
            .lock()
            .unwrap()
            .push((request.url.path().to_string(), Instant::now()));
        ResponseTemplate::new(200)
            .set_body_string(self.body.clone())
            .set_delay(self.delay)
    }
}

fn crawler_for(config: &pantry_scout::Config) -> Crawler {
    Crawler::new(
        &config.sites[0],
        &config.crawler,
        &config.output,
        CancellationToken::new(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_listing_with_three_detail_links() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let config = test_config(&server, tmp.path(), 1, 0);

    mount_page(
        &server,
        "/collections/all",
        listing_page(
            &["/products/a", "/products/b", "/products/c"],
            Some("/collections/all/page/2"),
        ),
        1,
    )
    .await;
    for slug in ["a", "b", "c"] {
        mount_page(
            &server,
            &format!("/products/{}", slug),
            detail_page(&format!("Pan {}", slug), "$12.99"),
            1,
        )
        .await;
    }
    // max-pages = 1: the next link must not be followed
    mount_page(&server, "/collections/all/page/2", listing_page(&[], None), 0).await;

    let crawler = crawler_for(&config);
    let pages = crawler
        .crawl_listing(&format!("{}/collections/all", server.uri()))
        .await;

    assert_eq!(pages, 1);
    let records = crawler.records();
    assert_eq!(records.len(), 3);
    for record in &records {
        assert!(record.text("title").is_some());
        assert_eq!(record.text("price"), Some("12.99"));
    }

    let category = tmp.path().join("records/ecommerce_sites");
    for slug in ["a", "b", "c"] {
        assert!(category.join(format!("{}.json", slug)).exists());
    }

    let stats = crawler.stats();
    assert_eq!(stats.listing_pages, 1);
    assert_eq!(stats.records_saved, 3);
}

#[tokio::test]
async fn test_pagination_followed_once_per_page() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let config = test_config(&server, tmp.path(), 5, 0);

    mount_page(
        &server,
        "/collections/all",
        listing_page(&["/products/a"], Some("/collections/all/page/2")),
        1,
    )
    .await;
    // Page 2 links back to page 1 and repeats a product
    mount_page(
        &server,
        "/collections/all/page/2",
        listing_page(&["/products/a", "/products/b"], Some("/collections/all")),
        1,
    )
    .await;
    mount_page(&server, "/products/a", detail_page("A", "$1.00"), 1).await;
    mount_page(&server, "/products/b", detail_page("B", "$2.00"), 1).await;

    let crawler = crawler_for(&config);
    let pages = crawler
        .crawl_listing(&format!("{}/collections/all", server.uri()))
        .await;

    assert_eq!(pages, 2);
    assert_eq!(crawler.records().len(), 2);
    assert_eq!(crawler.stats().skipped, 1);
}

#[tokio::test]
async fn test_second_detail_call_is_noop() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let config = test_config(&server, tmp.path(), 1, 0);
    mount_page(&server, "/products/kettle", detail_page("Kettle", "$30"), 1).await;

    let crawler = crawler_for(&config);
    let url = format!("{}/products/kettle", server.uri());

    assert_eq!(crawler.crawl_detail_page(&url).await, PageOutcome::Saved);
    assert_eq!(
        crawler.crawl_detail_page(&url).await,
        PageOutcome::AlreadyVisited
    );
    assert_eq!(crawler.records().len(), 1);
}

#[tokio::test]
async fn test_page_without_fields_is_discarded() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let config = test_config(&server, tmp.path(), 1, 0);
    mount_page(
        &server,
        "/products/blank",
        "<html><body><p>Coming soon</p></body></html>".to_string(),
        1,
    )
    .await;

    let crawler = crawler_for(&config);
    let outcome = crawler
        .crawl_detail_page(&format!("{}/products/blank", server.uri()))
        .await;

    assert_eq!(outcome, PageOutcome::EmptyRecord);
    assert!(crawler.records().is_empty());
    assert!(!tmp
        .path()
        .join("records/ecommerce_sites/blank.json")
        .exists());
}

#[tokio::test]
async fn test_aggregate_round_trip() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let config = test_config(&server, tmp.path(), 1, 0);

    mount_page(
        &server,
        "/collections/all",
        listing_page(&["/products/a", "/products/b"], None),
        1,
    )
    .await;
    mount_page(&server, "/products/a", detail_page("A", "$1.00"), 1).await;
    mount_page(&server, "/products/b", detail_page("B", "$2.00"), 1).await;

    let crawler = crawler_for(&config);
    crawler
        .crawl_listing(&format!("{}/collections/all", server.uri()))
        .await;

    let records = crawler.take_records();
    let destination = aggregate_path(&config.output, &config.sites[0]);
    flush(&records, &destination).unwrap();

    assert_eq!(destination, tmp.path().join("records/shop.json"));
    assert_eq!(read_aggregate(&destination).unwrap(), records);
}

#[tokio::test]
async fn test_detail_pool_is_bounded_and_joined_before_pagination() {
    const DETAIL_DELAY: Duration = Duration::from_millis(300);

    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let config = test_config(&server, tmp.path(), 2, 0);
    let workers = config.crawler.workers;
    let log = ArrivalLog::default();

    let details: Vec<String> = (1..=7).map(|i| format!("/products/p{}", i)).collect();
    let detail_refs: Vec<&str> = details.iter().map(String::as_str).collect();
    let pages = [
        (
            "/collections/all",
            listing_page(&detail_refs, Some("/collections/all/page/2")),
        ),
        ("/collections/all/page/2", listing_page(&[], None)),
    ];
    for (route, body) in pages {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(LoggedPage {
                log: Arc::clone(&log),
                body,
                delay: Duration::ZERO,
            })
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path_regex(r"^/products/p\d$"))
        .respond_with(LoggedPage {
            log: Arc::clone(&log),
            body: detail_page("Pot", "$5"),
            delay: DETAIL_DELAY,
        })
        .expect(7)
        .mount(&server)
        .await;

    let crawler = crawler_for(&config);
    let fetched = crawler
        .crawl_listing(&format!("{}/collections/all", server.uri()))
        .await;
    assert_eq!(fetched, 2);
    assert_eq!(crawler.records().len(), 7);

    let log = log.lock().unwrap().clone();
    let detail_times: Vec<Instant> = log
        .iter()
        .filter(|(path, _)| path.starts_with("/products/"))
        .map(|(_, at)| *at)
        .collect();
    assert_eq!(detail_times.len(), 7);

    // Requests that waited for a free worker arrive at least one response
    // delay after the one they waited on; closer arrivals ran concurrently.
    for (i, at) in detail_times.iter().enumerate() {
        let overlapping = detail_times[..i]
            .iter()
            .filter(|earlier| at.duration_since(**earlier) < DETAIL_DELAY / 2)
            .count();
        assert!(
            overlapping < workers,
            "{} detail fetches in flight with {} workers",
            overlapping + 1,
            workers
        );
    }

    // Page 2 waits until every page-1 detail response has come back
    let (_, page_two) = log
        .iter()
        .find(|(path, _)| path == "/collections/all/page/2")
        .unwrap();
    let last_detail = detail_times.iter().max().unwrap();
    assert!(page_two.duration_since(*last_detail) >= DETAIL_DELAY / 2);
}
