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

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// 浏览器启动或连接失败
    #[error("Browser launch failed: {0}")]
    Launch(String),
    /// 页面导航失败
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// 超时
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
    /// 会话内部错误
    #[error("Session error: {0}")]
    Session(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 浏览器会话选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// 是否无头模式
    pub headless: bool,
    /// User-Agent
    pub user_agent: String,
    /// 是否开启反自动化检测参数
    pub stealth: bool,
    /// 窗口大小
    pub window_size: (u32, u32),
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: String::new(),
            stealth: true,
            window_size: (1920, 1080),
        }
    }
}

/// 浏览器自动化能力
///
/// 每次调用 `open` 都返回一个独立的会话，会话之间不共享状态
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// 打开一个新会话
    async fn open(&self, options: &SessionOptions) -> Result<Box<dyn BrowserSession>, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}

/// 浏览器会话
///
/// 只做导航和只读查询。调用方负责在所有退出路径上调用 `close`。
#[async_trait]
pub trait BrowserSession: Send {
    /// 导航到指定地址，超时返回 `EngineError::Timeout`
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), EngineError>;

    /// 当前页面标题
    async fn title(&mut self) -> Result<String, EngineError>;

    /// 等待匹配选择器的元素出现，超时返回 `Ok(false)`
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, EngineError>;

    /// 当前渲染后的完整 HTML
    async fn content(&mut self) -> Result<String, EngineError>;

    /// 释放会话，重复调用无副作用
    async fn close(&mut self) -> Result<(), EngineError>;
}
