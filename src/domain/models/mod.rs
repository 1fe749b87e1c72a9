// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 包含型号标识、抓取请求与结果、批量结果、进度事件和任务实体
pub mod batch_result;
pub mod job;
pub mod model_identifier;
pub mod progress;
pub mod scrape_result;
