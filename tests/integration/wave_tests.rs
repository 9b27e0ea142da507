use crate::{detail_page, listing_page, mount_page, test_config};
use pantry_scout::crawler::Crawler;
use pantry_scout::storage::{JsonLedgerStore, LedgerList, LedgerStore};
use pantry_scout::waves::{resume_seeds, run_waves, SeedHarvester, WavePolicy, WaveReport};
use pantry_scout::Config;
use std::collections::HashSet;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn run_site_waves(
    config: &Config,
    store: &mut JsonLedgerStore,
    seeds: &[String],
) -> (WaveReport, SeedHarvester) {
    let cancel = CancellationToken::new();
    let crawler = Crawler::new(
        &config.sites[0],
        &config.crawler,
        &config.output,
        cancel.clone(),
    )
    .unwrap();
    let harvester = SeedHarvester::resume(crawler, &*store).unwrap();
    let op = {
        let harvester = harvester.clone();
        move |cycle: usize, url: String| {
            let harvester = harvester.clone();
            async move { harvester.harvest(cycle, url).await }
        }
    };

    let report = run_waves(
        store,
        seeds,
        &WavePolicy::new(config.retry.max_retries),
        &cancel,
        op,
    )
    .await
    .unwrap();
    (report, harvester)
}

#[tokio::test]
async fn test_failing_url_never_processed() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let config = test_config(&server, tmp.path(), 1, 0);

    mount_page(&server, "/products/good", detail_page("Good", "$5"), 1).await;
    Mock::given(method("GET"))
        .and(path("/products/bad"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let seeds = vec![
        format!("{}/products/good", server.uri()),
        format!("{}/products/bad", server.uri()),
    ];
    let mut store = JsonLedgerStore::new(tmp.path().join("ledger"), "shop");
    let (report, harvester) = run_site_waves(&config, &mut store, &seeds).await;

    // max-retries = 0: exactly one cycle
    assert_eq!(report.cycles_run, 1);
    assert_eq!(report.processed, vec![seeds[0].clone()]);
    assert_eq!(report.unresolved, vec![seeds[1].clone()]);

    // processed and unresolved partition the input
    let processed: HashSet<_> = report.processed.iter().collect();
    let unresolved: HashSet<_> = report.unresolved.iter().collect();
    assert!(processed.is_disjoint(&unresolved));
    assert_eq!(processed.len() + unresolved.len(), seeds.len());

    assert_eq!(store.load(LedgerList::Failed).unwrap(), vec![seeds[1].clone()]);
    assert_eq!(store.load(LedgerList::Pending).unwrap(), vec![seeds[1].clone()]);
    assert_eq!(store.load(LedgerList::Processed).unwrap(), vec![seeds[0].clone()]);

    let (records, stats) = harvester.finish();
    assert_eq!(records.len(), 1);
    assert_eq!(stats.fetch_failures, 1);
}

#[tokio::test]
async fn test_failed_sub_link_recovers_in_later_cycle() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let config = test_config(&server, tmp.path(), 1, 1);

    mount_page(
        &server,
        "/collections/all",
        listing_page(&["/products/steady", "/items/flaky"], None),
        1,
    )
    .await;
    mount_page(&server, "/products/steady", detail_page("Steady", "$3"), 1).await;
    // Fails every attempt of the first cycle, then recovers
    Mock::given(method("GET"))
        .and(path("/items/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    mount_page(&server, "/items/flaky", detail_page("Flaky", "$4"), 1).await;

    let listing = format!("{}/collections/all", server.uri());
    let flaky = format!("{}/items/flaky", server.uri());
    let mut store = JsonLedgerStore::new(tmp.path().join("ledger"), "shop");
    let (report, harvester) = run_site_waves(&config, &mut store, &[listing.clone()]).await;

    assert_eq!(report.cycles_run, 2);
    assert!(report.unresolved.is_empty());
    assert_eq!(report.processed.len(), 3);
    assert!(report.processed.contains(&listing));
    assert!(report.processed.contains(&flaky));

    let (records, _) = harvester.finish();
    assert_eq!(records.len(), 2);
    assert!(store.load(LedgerList::Pending).unwrap().is_empty());
}

#[tokio::test]
async fn test_discovered_detail_recovers_in_later_invocation() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let config = test_config(&server, tmp.path(), 1, 0);

    mount_page(
        &server,
        "/collections/all",
        listing_page(&["/items/flaky"], None),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/items/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    mount_page(&server, "/items/flaky", detail_page("Flaky", "$4"), 1).await;

    let listing = format!("{}/collections/all", server.uri());
    let flaky = format!("{}/items/flaky", server.uri());
    let mut store = JsonLedgerStore::new(tmp.path().join("ledger"), "shop");

    let (first, _) = run_site_waves(&config, &mut store, &[listing.clone()]).await;
    assert_eq!(first.unresolved, vec![flaky.clone()]);
    assert_eq!(store.load(LedgerList::Details).unwrap(), vec![flaky.clone()]);

    // A new invocation: fresh crawler and harvester, seeds from the ledger
    let seeds = resume_seeds(&mut store, &config.sites[0].seeds, false).unwrap();
    assert_eq!(seeds, vec![flaky.clone()]);

    let (second, harvester) = run_site_waves(&config, &mut store, &seeds).await;
    assert!(second.unresolved.is_empty());
    assert!(second.processed.contains(&flaky));

    let (records, stats) = harvester.finish();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text("title"), Some("Flaky"));
    assert_eq!(stats.listing_pages, 0);
}

#[tokio::test]
async fn test_listing_without_links_fails() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let config = test_config(&server, tmp.path(), 1, 0);
    mount_page(&server, "/collections/empty", listing_page(&[], None), 1).await;

    let seed = format!("{}/collections/empty", server.uri());
    let mut store = JsonLedgerStore::new(tmp.path().join("ledger"), "shop");
    let (report, _) = run_site_waves(&config, &mut store, &[seed.clone()]).await;

    assert!(report.processed.is_empty());
    assert_eq!(report.unresolved, vec![seed]);
}

#[tokio::test]
async fn test_unresolved_urls_resume_next_invocation() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let config = test_config(&server, tmp.path(), 1, 0);

    Mock::given(method("GET"))
        .and(path("/products/late"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    mount_page(&server, "/products/late", detail_page("Late", "$9"), 1).await;

    let late = format!("{}/products/late", server.uri());
    let mut store = JsonLedgerStore::new(tmp.path().join("ledger"), "shop");
    let (first, _) = run_site_waves(&config, &mut store, &[late.clone()]).await;
    assert_eq!(first.unresolved, vec![late.clone()]);

    let configured = config.sites[0].seeds.clone();
    let seeds = resume_seeds(&mut store, &configured, false).unwrap();
    assert_eq!(seeds, vec![late.clone()]);

    let (second, _) = run_site_waves(&config, &mut store, &seeds).await;
    assert!(second.unresolved.is_empty());
    assert_eq!(second.processed, vec![late]);
}
