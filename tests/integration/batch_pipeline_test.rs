// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    fast_config, product_page, scraper_for, PageScript, RecordingReporter, ScriptedDriver,
};
use mkprocessor::domain::models::model_identifier::ModelIdentifier;
use mkprocessor::domain::models::progress::ProgressEvent;
use mkprocessor::domain::models::scrape_result::ScrapeRequest;
use mkprocessor::domain::services::progress_reporter::ProgressReporter;
use mkprocessor::workers::batch_executor::BatchExecutor;
use mkprocessor::workers::item_scraper::{ItemScraper, PRODUCT_NOT_FOUND};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const ABC_URL: &str = "https://www.katom.com/7FT-ABC123.html";

fn models(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|m| m.to_string()).collect()
}

/// 端到端：一个存在的型号和一个不存在的型号
#[tokio::test(start_paused = true)]
async fn test_batch_with_found_and_missing_models() {
    let driver = Arc::new(ScriptedDriver::new().with_page(
        ABC_URL,
        PageScript::page("Heavy Duty Mixer | KaTom", product_page("Heavy Duty Mixer", "$1,299.00")),
    ));
    let reporter = Arc::new(RecordingReporter::default());
    let executor = BatchExecutor::new(
        scraper_for(driver.clone(), fast_config(2)),
        reporter.clone(),
        Duration::from_secs(1),
    );

    let batch = executor
        .run(&models(&["abc-123", "XYZ-999HC"]), "7FT", &CancellationToken::new())
        .await;

    assert_eq!(batch.total, 2);
    assert!(!batch.cancelled);
    assert!(batch.is_complete());

    assert_eq!(batch.successful.len(), 1);
    let product = &batch.successful[0];
    assert_eq!(product.model, "ABC123");
    assert_eq!(product.url, ABC_URL);
    assert_eq!(product.title, "Heavy Duty Mixer");
    assert_eq!(product.price, "1299.00");
    assert_eq!(product.main_image, "https://www.katom.com/images/main-product.jpg");
    assert_eq!(product.description, "<p>Commercial grade.</p>");
    assert_eq!(product.specs.get("weight"), Some("25 lb"));

    assert_eq!(batch.failed.len(), 1);
    assert_eq!(batch.failed[0].model, "XYZ999");
    assert_eq!(batch.failed[0].error, PRODUCT_NOT_FOUND);

    // The missing product short-circuits on its title, so only one page is read
    assert_eq!(driver.content_reads(), 1);
    assert_eq!(driver.opens(), 2);
    assert_eq!(driver.opens(), driver.closes());
}

#[tokio::test(start_paused = true)]
async fn test_failing_navigation_is_retried_then_recorded() {
    let driver = Arc::new(ScriptedDriver::new().with_page(
        ABC_URL,
        PageScript::NavigationError("net::ERR_CONNECTION_RESET".to_string()),
    ));
    let reporter = Arc::new(RecordingReporter::default());
    let executor = BatchExecutor::new(
        scraper_for(driver.clone(), fast_config(2)),
        reporter,
        Duration::ZERO,
    );

    let batch = executor
        .run(&models(&["ABC123"]), "7FT", &CancellationToken::new())
        .await;

    // One initial attempt plus two retries, each with its own session
    assert_eq!(driver.navigations(), 3);
    assert_eq!(driver.opens(), 3);
    assert_eq!(driver.closes(), 3);

    assert!(batch.successful.is_empty());
    assert_eq!(batch.failed.len(), 1);
    assert!(batch.failed[0].error.contains("ERR_CONNECTION_RESET"));
}

fn abc_request() -> ScrapeRequest {
    ScrapeRequest::new(ModelIdentifier::parse("ABC123").unwrap(), "7FT")
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_batch_does_not_retry() {
    let driver = Arc::new(ScriptedDriver::new().with_page(
        ABC_URL,
        PageScript::NavigationError("net::ERR_CONNECTION_RESET".to_string()),
    ));
    let scraper = scraper_for(driver.clone(), fast_config(2));
    let token = CancellationToken::new();
    token.cancel();

    let result = scraper.scrape(&abc_request(), &token).await;

    assert_eq!(driver.navigations(), 1);
    assert_eq!(driver.opens(), driver.closes());
    assert!(!result.found);
    assert!(result
        .error
        .as_deref()
        .is_some_and(|e| e.contains("ERR_CONNECTION_RESET")));
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_recovers_on_retry() {
    let driver = Arc::new(
        ScriptedDriver::new()
            .with_page(ABC_URL, PageScript::page("Mixer", product_page("Mixer", "$10.00")))
            .failing_first(ABC_URL, 1),
    );
    let scraper = scraper_for(driver.clone(), fast_config(2));

    let result = scraper.scrape(&abc_request(), &CancellationToken::new()).await;

    assert!(result.found);
    assert_eq!(result.title, "Mixer");
    assert!(result.error.is_none());
    assert_eq!(driver.navigations(), 2);
    assert_eq!(driver.opens(), 2);
    assert_eq!(driver.closes(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_each_attempt_gets_a_user_agent() {
    let driver = Arc::new(ScriptedDriver::new().with_page(
        ABC_URL,
        PageScript::NavigationError("boom".to_string()),
    ));
    let executor = BatchExecutor::new(
        scraper_for(driver.clone(), fast_config(1)),
        Arc::new(RecordingReporter::default()),
        Duration::ZERO,
    );

    executor
        .run(&models(&["ABC123"]), "7FT", &CancellationToken::new())
        .await;

    let agents = driver.user_agents();
    assert_eq!(agents.len(), 2);
    assert!(agents.iter().all(|ua| ua.starts_with("Mozilla/5.0")));
}

#[tokio::test(start_paused = true)]
async fn test_progress_is_monotonic_and_ends_completed() {
    let driver = Arc::new(ScriptedDriver::new().with_page(
        ABC_URL,
        PageScript::page("Mixer", product_page("Mixer", "$10.00")),
    ));
    let reporter = Arc::new(RecordingReporter::default());
    let executor = BatchExecutor::new(
        scraper_for(driver, fast_config(0)),
        reporter.clone(),
        Duration::from_secs(1),
    );

    executor
        .run(&models(&["ABC123", "   ", "MISSING1"]), "7FT", &CancellationToken::new())
        .await;

    let events = reporter.events.lock().clone();
    let currents: Vec<usize> = events.iter().map(|e| e.current).collect();
    assert_eq!(currents, vec![0, 1, 2, 3]);
    assert!(events.iter().all(|e| e.total == 3));
    assert!(events
        .windows(2)
        .all(|pair| pair[0].percentage <= pair[1].percentage));

    assert_eq!(events[0].model.as_deref(), Some("ABC123"));
    assert_eq!(events[0].message, "Scraping ABC123");
    let last = events.last().unwrap();
    assert_eq!(last.message, "Completed");
    assert_eq!(last.percentage, 100.0);
}

/// 在看到指定型号的进度时触发取消
struct CancelOnModel {
    model: &'static str,
    token: CancellationToken,
    inner: Arc<RecordingReporter>,
}

impl ProgressReporter for CancelOnModel {
    fn report(&self, event: &ProgressEvent) {
        self.inner.report(event);
        if event.model.as_deref() == Some(self.model) {
            self.token.cancel();
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_finishes_current_item_and_stops() {
    let driver = Arc::new(
        ScriptedDriver::new()
            .with_page(
                "https://www.katom.com/7FT-M1.html",
                PageScript::page("One", product_page("One", "$1.00")),
            )
            .with_page(
                "https://www.katom.com/7FT-M2.html",
                PageScript::page("Two", product_page("Two", "$2.00")),
            ),
    );
    let token = CancellationToken::new();
    let recorder = Arc::new(RecordingReporter::default());
    let reporter = Arc::new(CancelOnModel {
        model: "M2",
        token: token.clone(),
        inner: recorder.clone(),
    });
    let executor = BatchExecutor::new(
        scraper_for(driver.clone(), fast_config(2)),
        reporter,
        Duration::from_secs(1),
    );

    let batch = executor.run(&models(&["M1", "M2", "M3"]), "7FT", &token).await;

    assert!(batch.cancelled);
    assert_eq!(batch.processed(), 2);
    let titles: Vec<&str> = batch.successful.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["One", "Two"]);
    assert_eq!(driver.opens(), 2);

    let events = recorder.events.lock().clone();
    let last = events.last().unwrap();
    assert_eq!(last.message, "Cancelled");
    assert_eq!((last.current, last.total), (2, 3));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_before_start_scrapes_nothing() {
    let driver = Arc::new(ScriptedDriver::new());
    let token = CancellationToken::new();
    token.cancel();

    let executor = BatchExecutor::new(
        scraper_for(driver.clone(), fast_config(2)),
        Arc::new(RecordingReporter::default()),
        Duration::from_secs(1),
    );
    let batch = executor.run(&models(&["M1", "M2"]), "", &token).await;

    assert!(batch.cancelled);
    assert_eq!(batch.processed(), 0);
    assert_eq!(driver.opens(), 0);
}
