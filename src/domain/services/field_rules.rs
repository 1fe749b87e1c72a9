// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::Selector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 选择器规则错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// 按顺序尝试的选择器列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorChain(pub Vec<String>);

impl SelectorChain {
    pub fn new<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(selectors.into_iter().map(Into::into).collect())
    }

    fn compile(&self) -> Result<CompiledChain, RuleError> {
        self.0
            .iter()
            .map(|s| compile_one(s))
            .collect::<Result<Vec<_>, _>>()
            .map(CompiledChain)
    }
}

/// 商品页字段的选择器规则
///
/// 每个字段是一条有序的选择器链，提取时按顺序尝试，第一个产生有效值的选择器胜出。
/// 默认值对应 KaTom 商品页的结构。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRules {
    pub title: SelectorChain,
    /// 页面就绪时等待的元素
    pub ready: String,
    /// 主价格位置，文本不做价格格式过滤
    pub price_primary: SelectorChain,
    /// 备用价格位置，文本必须像价格
    pub price_fallback: SelectorChain,
    pub main_image: SelectorChain,
    pub additional_images: SelectorChain,
    /// 标签页容器，取其中的段落
    pub description_tabs: String,
    pub description_fallback: SelectorChain,
    pub specs_tables: SelectorChain,
    pub spec_rows: String,
    pub spec_key: String,
    pub spec_value: String,
    pub videos: SelectorChain,
    pub nested_videos: SelectorChain,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            title: SelectorChain::new([
                "h1.product-name.mb-0",
                "h1.product-title",
                "h1[itemprop='name']",
                "h1",
            ]),
            ready: "h1.product-name.mb-0, h1".to_string(),
            price_primary: SelectorChain::new(["p.product-price-text.m-0"]),
            price_fallback: SelectorChain::new([
                ".product-price",
                ".price",
                "[class*='price']",
                ".regular-price",
                ".our-price",
                ".sale-price",
                "span[itemprop='price']",
            ]),
            main_image: SelectorChain::new([
                ".product-img img",
                ".main-product-image",
                "img.main-image",
                "img[itemprop='image']",
                ".product-image-container img",
            ]),
            additional_images: SelectorChain::new([
                ".additional-images img",
                ".product-thumbnails img",
                ".thumb-image",
                ".product-gallery img",
                "[class*='thumbnail'] img",
            ]),
            description_tabs: ".tab-content".to_string(),
            description_fallback: SelectorChain::new([
                ".product-description",
                ".description",
                "[class*='description']",
                "#product-description",
                "#description",
            ]),
            specs_tables: SelectorChain::new(["table.table.table-condensed.specs-table", "table"]),
            spec_rows: ".specs-row, [class*='spec']".to_string(),
            spec_key: ".spec-key, .spec-name, [class*='key'], [class*='name']".to_string(),
            spec_value: ".spec-value, .spec-val, [class*='value'], [class*='val']".to_string(),
            videos: SelectorChain::new(["source[src*='.mp4'], source[type*='video']"]),
            nested_videos: SelectorChain::new(["video source"]),
        }
    }
}

impl FieldRules {
    /// 编译全部选择器，任何一个无效都会返回错误
    pub fn compile(&self) -> Result<CompiledRules, RuleError> {
        compile_one(&self.ready)?;
        Ok(CompiledRules {
            ready: self.ready.clone(),
            title: self.title.compile()?,
            price_primary: self.price_primary.compile()?,
            price_fallback: self.price_fallback.compile()?,
            main_image: self.main_image.compile()?,
            all_images: compile_one("img")?,
            additional_images: self.additional_images.compile()?,
            description_tabs: compile_one(&self.description_tabs)?,
            paragraphs: compile_one("p")?,
            description_fallback: self.description_fallback.compile()?,
            specs_tables: self.specs_tables.compile()?,
            table_rows: compile_one("tr")?,
            table_cells: compile_one("td, th")?,
            spec_rows: compile_one(&self.spec_rows)?,
            spec_key: compile_one(&self.spec_key)?,
            spec_value: compile_one(&self.spec_value)?,
            videos: self.videos.compile()?,
            nested_videos: self.nested_videos.compile()?,
        })
    }
}

/// 已编译的选择器链
#[derive(Debug, Clone)]
pub struct CompiledChain(Vec<Selector>);

impl CompiledChain {
    pub fn iter(&self) -> impl Iterator<Item = &Selector> {
        self.0.iter()
    }
}

/// 已编译的字段规则，构造一次后在每个页面上复用
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub ready: String,
    pub title: CompiledChain,
    pub price_primary: CompiledChain,
    pub price_fallback: CompiledChain,
    pub main_image: CompiledChain,
    pub all_images: Selector,
    pub additional_images: CompiledChain,
    pub description_tabs: Selector,
    pub paragraphs: Selector,
    pub description_fallback: CompiledChain,
    pub specs_tables: CompiledChain,
    pub table_rows: Selector,
    pub table_cells: Selector,
    pub spec_rows: Selector,
    pub spec_key: Selector,
    pub spec_value: Selector,
    pub videos: CompiledChain,
    pub nested_videos: CompiledChain,
}

fn compile_one(selector: &str) -> Result<Selector, RuleError> {
    Selector::parse(selector).map_err(|e| RuleError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
