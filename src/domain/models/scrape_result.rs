// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::model_identifier::ModelIdentifier;

/// 抓取请求
///
/// 每个型号在执行器迭代时构造一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    /// 规范化后的型号
    pub model: ModelIdentifier,
    /// 站点分类前缀，可以为空
    pub prefix: String,
}

impl ScrapeRequest {
    pub fn new(model: ModelIdentifier, prefix: impl Into<String>) -> Self {
        Self {
            model,
            prefix: prefix.into(),
        }
    }

    /// 构建商品页地址 `<base>/<prefix>-<model>.html`
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}-{}.html",
            base_url.trim_end_matches('/'),
            self.prefix,
            self.model
        )
    }
}

/// 规格表中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecEntry {
    pub key: String,
    pub value: String,
}

/// 有序规格表
///
/// 保留页面上的行顺序，键重复时只保留第一次出现的值。
/// 序列化为 JSON 对象，键顺序与页面一致。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecTable {
    entries: Vec<SpecEntry>,
}

impl SpecTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入一行，键已存在时忽略并返回 `false`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push(SpecEntry {
            key,
            value: value.into(),
        });
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpecEntry> {
        self.entries.iter()
    }
}

impl Serialize for SpecTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key, &entry.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SpecTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SpecTableVisitor;

        impl<'de> Visitor<'de> for SpecTableVisitor {
            type Value = SpecTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of attribute names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SpecTable, A::Error> {
                let mut table = SpecTable::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    table.insert(key, value);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(SpecTableVisitor)
    }
}

/// 从商品页提取出的字段集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFields {
    pub title: String,
    pub description: String,
    pub specs: SpecTable,
    pub specs_html: String,
    pub price: String,
    pub main_image: String,
    pub additional_images: Vec<String>,
    pub video_links: Vec<String>,
}

/// 单个型号的抓取结果
///
/// 构造后不再修改。`found=false` 表示没有提取到标题，
/// 此时除 `error` 外的字段都是空值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub model: String,
    pub url: String,
    pub found: bool,
    pub title: String,
    /// HTML 片段
    pub description: String,
    pub specs: SpecTable,
    pub specs_html: String,
    /// 纯数字价格，没有价格时为空字符串
    pub price: String,
    pub main_image: String,
    pub additional_images: Vec<String>,
    pub video_links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeResult {
    /// 商品页存在且提取到了标题
    pub fn found(model: &ModelIdentifier, url: impl Into<String>, fields: ProductFields) -> Self {
        Self {
            model: model.to_string(),
            url: url.into(),
            found: true,
            title: fields.title,
            description: fields.description,
            specs: fields.specs,
            specs_html: fields.specs_html,
            price: fields.price,
            main_image: fields.main_image,
            additional_images: fields.additional_images,
            video_links: fields.video_links,
            error: None,
        }
    }

    /// 商品页不存在或没有标题
    pub fn not_found(model: &ModelIdentifier, url: impl Into<String>, error: Option<String>) -> Self {
        Self {
            model: model.to_string(),
            url: url.into(),
            found: false,
            title: String::new(),
            description: String::new(),
            specs: SpecTable::new(),
            specs_html: String::new(),
            price: String::new(),
            main_image: String::new(),
            additional_images: Vec::new(),
            video_links: Vec::new(),
            error,
        }
    }
}
