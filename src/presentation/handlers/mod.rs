// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// - 任务（job_handler）：提交、查询、取消任务和统计
/// - 推送（ws_handler）：WebSocket 进度通道
pub mod job_handler;
pub mod ws_handler;
