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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use crate::utils::retry_policy::RetryPolicy;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含服务器、抓取器、浏览器、进度推送和日志等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 抓取器配置
    pub scraper: ScraperSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 进度推送配置
    pub progress: ProgressSettings,
    /// 日志配置
    pub logging: LoggingSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 抓取器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperSettings {
    /// 目标站点根地址，例如 `https://www.katom.com`
    pub base_url: String,
    /// 单个型号的重试次数
    pub retries: u32,
    /// 重试前等待时间（毫秒），指数退避时为初始等待
    pub retry_delay_ms: u64,
    /// 是否使用指数退避（带抖动），默认关闭
    pub exponential_backoff: bool,
    /// 指数退避的等待上限（毫秒）
    pub max_retry_delay_ms: u64,
    /// 两个型号之间的间隔（毫秒）
    pub item_delay_ms: u64,
    /// 页面加载超时（秒）
    pub page_load_timeout_secs: u64,
    /// 等待标题元素的超时（秒）
    pub element_wait_timeout_secs: u64,
    /// 图片最小宽度（像素）
    pub min_image_width: u32,
    /// 图片最小高度（像素）
    pub min_image_height: u32,
    /// 图片尺寸探测超时（秒）
    pub image_probe_timeout_secs: u64,
    /// 附加图片数量上限
    pub max_images: usize,
    /// 视频链接数量上限
    pub max_videos: usize,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 是否无头模式
    pub headless: bool,
    /// 远程 Chrome 调试地址，设置后不再本地启动浏览器
    pub remote_url: Option<String>,
    /// Chrome 可执行文件路径
    pub executable: Option<String>,
    /// 窗口宽度
    pub window_width: u32,
    /// 窗口高度
    pub window_height: u32,
}

/// 进度推送配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressSettings {
    /// 每个订阅者的缓冲容量
    pub channel_capacity: usize,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 是否输出 JSON 格式日志
    pub json: bool,
}

/// 抓取运行时配置
///
/// 由 [`ScraperSettings`] 转换而来，时间字段已换算为 `Duration`
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub retries: u32,
    pub retry_delay: Duration,
    pub exponential_backoff: bool,
    pub max_retry_delay: Duration,
    pub item_delay: Duration,
    pub page_load_timeout: Duration,
    pub element_wait_timeout: Duration,
    pub min_image_width: u32,
    pub min_image_height: u32,
    pub max_images: usize,
    pub max_videos: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.katom.com".to_string(),
            retries: 2,
            retry_delay: Duration::from_secs(2),
            exponential_backoff: false,
            max_retry_delay: Duration::from_secs(30),
            item_delay: Duration::from_secs(1),
            page_load_timeout: Duration::from_secs(30),
            element_wait_timeout: Duration::from_secs(10),
            min_image_width: 300,
            min_image_height: 300,
            max_images: 5,
            max_videos: 5,
        }
    }
}

impl From<&ScraperSettings> for ScraperConfig {
    fn from(s: &ScraperSettings) -> Self {
        Self {
            base_url: s.base_url.trim_end_matches('/').to_string(),
            retries: s.retries,
            retry_delay: Duration::from_millis(s.retry_delay_ms),
            exponential_backoff: s.exponential_backoff,
            max_retry_delay: Duration::from_millis(s.max_retry_delay_ms),
            item_delay: Duration::from_millis(s.item_delay_ms),
            page_load_timeout: Duration::from_secs(s.page_load_timeout_secs),
            element_wait_timeout: Duration::from_secs(s.element_wait_timeout_secs),
            min_image_width: s.min_image_width,
            min_image_height: s.min_image_height,
            max_images: s.max_images,
            max_videos: s.max_videos,
        }
    }
}

impl ScraperConfig {
    /// 单个型号的重试策略，默认固定间隔
    pub fn retry_policy(&self) -> RetryPolicy {
        if self.exponential_backoff {
            RetryPolicy::exponential(self.retries, self.retry_delay, self.max_retry_delay)
        } else {
            RetryPolicy::fixed(self.retries, self.retry_delay)
        }
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次读取默认值、`config/default.toml`、`config/<APP_ENVIRONMENT>.toml`
    /// 以及 `MKPROC__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("MKPROC").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// 仅使用内置默认值构建配置，不读取文件和环境变量
    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            // Scraper defaults
            .set_default("scraper.base_url", "https://www.katom.com")?
            .set_default("scraper.retries", 2)?
            .set_default("scraper.retry_delay_ms", 2000)?
            .set_default("scraper.exponential_backoff", false)?
            .set_default("scraper.max_retry_delay_ms", 30000)?
            .set_default("scraper.item_delay_ms", 1000)?
            .set_default("scraper.page_load_timeout_secs", 30)?
            .set_default("scraper.element_wait_timeout_secs", 10)?
            .set_default("scraper.min_image_width", 300)?
            .set_default("scraper.min_image_height", 300)?
            .set_default("scraper.image_probe_timeout_secs", 10)?
            .set_default("scraper.max_images", 5)?
            .set_default("scraper.max_videos", 5)?
            // Browser defaults
            .set_default("browser.headless", true)?
            .set_default("browser.window_width", 1920)?
            .set_default("browser.window_height", 1080)?
            .set_default("progress.channel_capacity", 256)?
            .set_default("logging.json", false)
    }

    /// 转换为抓取运行时配置
    pub fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig::from(&self.scraper)
    }
}
