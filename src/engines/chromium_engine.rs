// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{BrowserDriver, BrowserSession, EngineError, SessionOptions};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Chromium 引擎
///
/// 基于 chromiumoxide 的浏览器自动化实现。每个会话独占一个浏览器进程
/// （或远程浏览器上的一个独立连接和页面），关闭会话时一并释放。
pub struct ChromiumDriver {
    settings: BrowserSettings,
}

impl ChromiumDriver {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn launch_config(
        &self,
        options: &SessionOptions,
        profile_dir: &Path,
    ) -> Result<BrowserConfig, EngineError> {
        let (width, height) = options.window_size;
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(width, height)
            .user_data_dir(profile_dir)
            .request_timeout(Duration::from_secs(30))
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", options.user_agent));

        if !options.headless {
            builder = builder.with_head();
        }
        if options.stealth {
            builder = builder
                .arg("--disable-blink-features=AutomationControlled")
                .arg("--disable-infobars");
        }
        if let Some(path) = &self.settings.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(EngineError::Launch)
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn open(&self, options: &SessionOptions) -> Result<Box<dyn BrowserSession>, EngineError> {
        let mut profile_dir = None;

        let (browser, mut handler) = if let Some(url) = &self.settings.remote_url {
            debug!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url.as_str())
                .await
                .map_err(|e| EngineError::Launch(format!("Failed to connect to remote Chrome: {}", e)))?
        } else {
            let dir = std::env::temp_dir().join(format!("mkprocessor-{}", Uuid::new_v4()));
            let config = self.launch_config(options, &dir)?;
            profile_dir = Some(dir);
            Browser::launch(config)
                .await
                .map_err(|e| EngineError::Launch(e.to_string()))?
        };

        // Drive the CDP connection until the browser goes away
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let mut session = ChromiumSession {
            owns_browser: self.settings.remote_url.is_none(),
            browser: Some(browser),
            page: None,
            handler: Some(handler_task),
            profile_dir,
        };

        if let Err(e) = session.prepare_page(options).await {
            let _ = session.close().await;
            return Err(e);
        }

        Ok(Box::new(session))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// 单次抓取使用的浏览器会话
pub struct ChromiumSession {
    owns_browser: bool,
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    profile_dir: Option<PathBuf>,
}

impl ChromiumSession {
    async fn prepare_page(&mut self, options: &SessionOptions) -> Result<(), EngineError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| EngineError::Session("browser already closed".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Session(e.to_string()))?;

        if !options.user_agent.is_empty() {
            page.set_user_agent(options.user_agent.as_str())
                .await
                .map_err(|e| EngineError::Session(e.to_string()))?;
        }
        if options.stealth {
            page.evaluate_on_new_document(HIDE_WEBDRIVER_SCRIPT)
                .await
                .map_err(|e| EngineError::Session(e.to_string()))?;
        }

        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page, EngineError> {
        self.page
            .as_ref()
            .ok_or_else(|| EngineError::Session("page is not open".to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, limit: Duration) -> Result<(), EngineError> {
        let page = self.page()?;
        timeout(limit, page.goto(url))
            .await
            .map_err(|_| EngineError::Timeout(limit))?
            .map_err(|e| EngineError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn title(&mut self) -> Result<String, EngineError> {
        let page = self.page()?;
        let title = page
            .get_title()
            .await
            .map_err(|e| EngineError::Session(e.to_string()))?;
        Ok(title.unwrap_or_default())
    }

    async fn wait_for(&mut self, selector: &str, limit: Duration) -> Result<bool, EngineError> {
        let page = self.page()?;
        let deadline = Instant::now() + limit;

        loop {
            if page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn content(&mut self) -> Result<String, EngineError> {
        let page = self.page()?;
        page.content()
            .await
            .map_err(|e| EngineError::Session(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        let mut first_error = None;

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                first_error.get_or_insert(EngineError::Session(e.to_string()));
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if self.owns_browser {
                if let Err(e) = browser.close().await {
                    first_error.get_or_insert(EngineError::Session(e.to_string()));
                }
                if let Err(e) = browser.wait().await {
                    warn!("Browser process did not exit cleanly: {}", e);
                }
            }
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        if let Some(dir) = self.profile_dir.take() {
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                debug!("Failed to remove browser profile {}: {}", dir.display(), e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// 会话没有经过 `close` 就被丢弃时（任务 panic 或被中止）的兜底清理
impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        // Dropping the browser kills the child before its profile is removed
        drop(self.page.take());
        drop(self.browser.take());

        if let Some(dir) = self.profile_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                debug!("Failed to remove browser profile {}: {}", dir.display(), e);
            }
        }
    }
}
