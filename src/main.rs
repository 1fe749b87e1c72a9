// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Context;
use mkprocessor::application::usecases::job_service::JobService;
use mkprocessor::config::settings::Settings;
use mkprocessor::domain::services::extraction_service::FieldExtractor;
use mkprocessor::domain::services::field_rules::FieldRules;
use mkprocessor::domain::services::progress_reporter::{
    CompositeReporter, LogReporter, ProgressReporter,
};
use mkprocessor::engines::chromium_engine::ChromiumDriver;
use mkprocessor::engines::image_probe::HttpImageProbe;
use mkprocessor::engines::traits::SessionOptions;
use mkprocessor::infrastructure::progress_hub::ProgressHub;
use mkprocessor::infrastructure::repositories::memory_job_repo::InMemoryJobRepository;
use mkprocessor::presentation::routes;
use mkprocessor::utils::telemetry;
use mkprocessor::workers::item_scraper::SingleItemScraper;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new().context("failed to load configuration")?;

    // 2. Initialize logging
    telemetry::init_telemetry(&settings.logging);
    info!("Starting MK Processor...");

    // 3. Build the scraping pipeline
    let config = settings.scraper_config();
    let probe = HttpImageProbe::new(
        config.min_image_width,
        config.min_image_height,
        Duration::from_secs(settings.scraper.image_probe_timeout_secs),
    )?;
    let extractor = FieldExtractor::new(&FieldRules::default(), Arc::new(probe), &config)?;
    let driver = ChromiumDriver::new(settings.browser.clone());
    let session = SessionOptions {
        headless: settings.browser.headless,
        window_size: (settings.browser.window_width, settings.browser.window_height),
        ..SessionOptions::default()
    };
    let item_delay = config.item_delay;
    let scraper = SingleItemScraper::new(Arc::new(driver), Arc::new(extractor), config, session);
    info!("Scraper initialized against {}", settings.scraper.base_url);

    // 4. Job registry and progress delivery
    let hub = Arc::new(ProgressHub::new(settings.progress.channel_capacity));
    let observers: Vec<Arc<dyn ProgressReporter>> = vec![hub.clone(), Arc::new(LogReporter)];
    let reporter = CompositeReporter::new(observers);
    let service = Arc::new(JobService::new(
        Arc::new(InMemoryJobRepository::new()),
        Arc::new(scraper),
        Arc::new(reporter),
        item_delay,
    ));

    // 5. Start HTTP server
    let app = routes::routes(service.clone(), hub);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    let shutdown_service = service.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            match signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(err) => error!("Unable to listen for shutdown signal: {}", err),
            }
            shutdown_service.shutdown();
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
