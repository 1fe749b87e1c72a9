// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 仓库实现（repositories）：进程内任务表
/// - 进度广播（progress_hub）：把进度事件推送给 WebSocket 观察者
///
/// 基础设施层依赖领域层的抽象接口，领域层不感知这里的实现。
pub mod progress_hub;
pub mod repositories;
