// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use image::ImageReader;
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// 图片探测错误
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status {0}")]
    Status(u16),
    #[error("Decode failed: {0}")]
    Decode(String),
}

/// 图片尺寸探测
///
/// 判断一张图片是否达到最小尺寸，失败一律视为不达标
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn meets_min_size(&self, url: &str) -> bool;
}

/// 基于 HTTP 下载的图片尺寸探测
pub struct HttpImageProbe {
    client: reqwest::Client,
    min_width: u32,
    min_height: u32,
}

impl HttpImageProbe {
    pub fn new(min_width: u32, min_height: u32, timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            min_width,
            min_height,
        })
    }

    /// 下载图片并读取宽高
    pub async fn dimensions(&self, url: &str) -> Result<(u32, u32), ProbeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ProbeError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;

        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ProbeError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| ProbeError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn meets_min_size(&self, url: &str) -> bool {
        match self.dimensions(url).await {
            Ok((width, height)) => width >= self.min_width && height >= self.min_height,
            Err(e) => {
                debug!("Error checking image size for {}: {}", url, e);
                false
            }
        }
    }
}
