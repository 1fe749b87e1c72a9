// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 字段提取（extraction_service）：把商品页 HTML 转换为结构化字段
/// - 选择器规则（field_rules）：每个字段的有序选择器链
/// - 值归一化（normalization）：价格、重量和 HTML 清理
/// - 进度上报（progress_reporter）：执行器向观察者推送进度的接口
pub mod extraction_service;
pub mod field_rules;
pub mod normalization;
pub mod progress_reporter;
