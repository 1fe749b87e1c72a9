// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use dashmap::DashMap;
use mkprocessor::engines::image_probe::ImageProbe;
use mkprocessor::engines::traits::{BrowserDriver, BrowserSession, EngineError, SessionOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 某个地址的脚本化响应
#[derive(Debug, Clone)]
pub enum PageScript {
    /// 导航成功，返回给定标题和 HTML
    Page { title: String, html: String },
    /// 导航总是失败
    NavigationError(String),
}

impl PageScript {
    pub fn page(title: impl Into<String>, html: impl Into<String>) -> Self {
        Self::Page {
            title: title.into(),
            html: html.into(),
        }
    }
}

#[derive(Default)]
struct Counters {
    opens: AtomicUsize,
    navigations: AtomicUsize,
    closes: AtomicUsize,
    contents: AtomicUsize,
}

/// 按地址返回预设页面的浏览器驱动，记录会话的打开、导航和关闭次数
///
/// 未登记的地址按 404 页面处理
#[derive(Default)]
pub struct ScriptedDriver {
    pages: DashMap<String, PageScript>,
    failures: Arc<DashMap<String, usize>>,
    counters: Arc<Counters>,
    user_agents: parking_lot::Mutex<Vec<String>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, script: PageScript) -> Self {
        self.pages.insert(url.to_string(), script);
        self
    }

    /// 该地址的前 `times` 次导航失败，之后按脚本返回
    pub fn failing_first(self, url: &str, times: usize) -> Self {
        self.failures.insert(url.to_string(), times);
        self
    }

    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> usize {
        self.counters.navigations.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    /// 读取页面内容的次数，即进入提取阶段的次数
    pub fn content_reads(&self) -> usize {
        self.counters.contents.load(Ordering::SeqCst)
    }

    pub fn user_agents(&self) -> Vec<String> {
        self.user_agents.lock().clone()
    }
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn open(&self, options: &SessionOptions) -> Result<Box<dyn BrowserSession>, EngineError> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        self.user_agents.lock().push(options.user_agent.clone());
        Ok(Box::new(ScriptedSession {
            pages: self.pages.clone(),
            failures: self.failures.clone(),
            counters: self.counters.clone(),
            current: None,
            closed: false,
        }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct ScriptedSession {
    pages: DashMap<String, PageScript>,
    failures: Arc<DashMap<String, usize>>,
    counters: Arc<Counters>,
    current: Option<(String, String)>,
    closed: bool,
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), EngineError> {
        self.counters.navigations.fetch_add(1, Ordering::SeqCst);
        if let Some(mut remaining) = self.failures.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(EngineError::Navigation("net::ERR_TIMED_OUT".to_string()));
            }
        }
        let script = self.pages.get(url).map(|entry| entry.value().clone());
        match script {
            Some(PageScript::Page { title, html }) => {
                self.current = Some((title, html));
                Ok(())
            }
            Some(PageScript::NavigationError(reason)) => Err(EngineError::Navigation(reason)),
            None => {
                self.current = Some((
                    "404 Page Not Found".to_string(),
                    "<html><body><p>Missing</p></body></html>".to_string(),
                ));
                Ok(())
            }
        }
    }

    async fn title(&mut self) -> Result<String, EngineError> {
        self.current
            .as_ref()
            .map(|(title, _)| title.clone())
            .ok_or_else(|| EngineError::Session("no page loaded".to_string()))
    }

    async fn wait_for(&mut self, _selector: &str, _timeout: Duration) -> Result<bool, EngineError> {
        Ok(self.current.is_some())
    }

    async fn content(&mut self) -> Result<String, EngineError> {
        self.counters.contents.fetch_add(1, Ordering::SeqCst);
        self.current
            .as_ref()
            .map(|(_, html)| html.clone())
            .ok_or_else(|| EngineError::Session("no page loaded".to_string()))
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        if !self.closed {
            self.closed = true;
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// 所有图片都视为达到最小尺寸
pub struct AcceptAllProbe;

#[async_trait]
impl ImageProbe for AcceptAllProbe {
    async fn meets_min_size(&self, _url: &str) -> bool {
        true
    }
}
