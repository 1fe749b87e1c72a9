// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// - 单型号抓取（item_scraper）：一个型号一次浏览器会话，失败重试
/// - 批量执行（batch_executor）：按顺序抓取一批型号并上报进度
/// - 任务工作器（job_worker）：执行一个任务并写回任务表
pub mod batch_executor;
pub mod item_scraper;
pub mod job_worker;
pub mod worker;
