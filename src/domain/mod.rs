// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：型号、抓取结果、批量结果、进度事件和任务
/// - 仓库接口（repositories）：任务存储的抽象接口
/// - 服务（services）：字段提取、值归一化和进度上报
///
/// 领域层不依赖具体的浏览器或存储实现。
pub mod models;
pub mod repositories;
pub mod services;
