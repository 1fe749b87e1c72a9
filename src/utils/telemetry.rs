// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::LoggingSettings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,mkprocessor=debug";

/// 默认日志过滤器，`RUST_LOG` 优先
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// 初始化日志
///
/// `logging.json = true` 时输出 JSON 格式，否则输出可读文本。
/// 重复初始化会被忽略。
pub fn init_telemetry(settings: &LoggingSettings) {
    let registry = tracing_subscriber::registry().with(env_filter());

    let result = if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("Telemetry already initialised: {}", e);
    }
}
