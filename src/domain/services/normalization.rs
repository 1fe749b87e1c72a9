// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;

static PRICE_WITH_CENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d,]*\.\d{2}").expect("Failed to compile price regex"));
static PRICE_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d,]*").expect("Failed to compile digits regex"));
static CENTS_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\d{2}").expect("Failed to compile cents regex"));
static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(\.\d+)?").expect("Failed to compile number regex"));
static UNIT_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\d.]+$").expect("Failed to compile unit regex"));
static IMG_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<img[^>]*>").expect("Failed to compile img regex"));

/// 重量字段的固定补偿值
pub const WEIGHT_PADDING: f64 = 5.0;

/// 从价格文本中提取纯数字价格
///
/// 优先匹配带两位小数的金额，其次是整数，去掉千分位逗号。
/// 两者都没有时返回空字符串。
pub fn extract_price(text: &str) -> String {
    PRICE_WITH_CENTS
        .find(text)
        .or_else(|| PRICE_DIGITS.find(text))
        .map(|m| m.as_str().replace(',', ""))
        .unwrap_or_default()
}

/// 文本是否看起来像价格（含 `$` 或者带两位小数的数字）
pub fn looks_like_price(text: &str) -> bool {
    text.contains('$') || CENTS_RUN.is_match(text)
}

/// 重量规格归一化
///
/// 取第一个数字，向上取整后加上补偿值，末尾单位去掉空白后用一个空格拼回。
/// 例如 `"42.3 lb"` -> `"48 lb"`，`"12kg"` -> `"17 kg"`。没有数字时原样返回。
pub fn normalize_weight(value: &str) -> String {
    let Some(number) = LEADING_NUMBER.find(value) else {
        return value.to_string();
    };
    let Ok(magnitude) = number.as_str().parse::<f64>() else {
        return value.to_string();
    };

    let padded = (magnitude.ceil() + WEIGHT_PADDING) as i64;
    let unit = UNIT_SUFFIX
        .find(value)
        .map(|m| m.as_str().trim())
        .unwrap_or_default();

    if unit.is_empty() {
        padded.to_string()
    } else {
        format!("{} {}", padded, unit)
    }
}

/// 去掉 HTML 片段中的 `<img>` 标签
pub fn strip_images(html: &str) -> String {
    IMG_TAG.replace_all(html, "").into_owned()
}

/// 合并连续空白并去掉首尾空白
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
