// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperConfig;
use crate::domain::models::model_identifier::ModelIdentifier;
use crate::domain::models::scrape_result::{ProductFields, SpecTable};
use crate::domain::services::field_rules::{CompiledChain, CompiledRules, FieldRules, RuleError};
use crate::domain::services::normalization::{
    clean_text, extract_price, looks_like_price, normalize_weight, strip_images,
};
use crate::engines::image_probe::ImageProbe;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use tracing::debug;
use url::Url;

const SPECS_TABLE_OPEN: &str = r#"<table class="specs-table" cellspacing="0" cellpadding="4" border="1" style="margin-top:10px;border-collapse:collapse;width:auto;" align="left"><tbody>"#;
const SPECS_TABLE_CLOSE: &str = "</tbody></table>";

/// 字段提取器
///
/// 负责把渲染后的商品页 HTML 转换为 `ProductFields`。
///
/// 提取分两步：先同步解析 HTML，按选择器链收集所有候选值；
/// 再异步对图片候选做尺寸探测。`Html` 不是 `Send`，
/// 所以解析结果不会跨越 await 点。
pub struct FieldExtractor {
    rules: CompiledRules,
    probe: Arc<dyn ImageProbe>,
    max_images: usize,
    max_videos: usize,
}

/// 同步解析阶段的产物，只包含拥有所有权的数据
#[derive(Debug, Default)]
struct PageCandidates {
    title: String,
    price: String,
    main_images: Vec<String>,
    gallery: Vec<String>,
    description: String,
    specs: SpecTable,
    specs_html: String,
    videos: Vec<String>,
}

impl FieldExtractor {
    /// 创建字段提取器
    ///
    /// # 参数
    ///
    /// * `rules` - 选择器规则
    /// * `probe` - 图片尺寸探测
    /// * `config` - 抓取配置，提供图片和视频数量上限
    pub fn new(
        rules: &FieldRules,
        probe: Arc<dyn ImageProbe>,
        config: &ScraperConfig,
    ) -> Result<Self, RuleError> {
        Ok(Self {
            rules: rules.compile()?,
            probe,
            max_images: config.max_images,
            max_videos: config.max_videos,
        })
    }

    /// 页面就绪时应出现的元素
    pub fn ready_selector(&self) -> &str {
        &self.rules.ready
    }

    /// 从页面 HTML 中提取商品字段
    ///
    /// 没有找到标题时返回 `None`，此时不会进行任何图片探测。
    pub async fn extract(
        &self,
        html: &str,
        page_url: &str,
        model: &ModelIdentifier,
    ) -> Option<ProductFields> {
        let candidates = self.collect(html, page_url, model)?;

        let main_image = self.pick_main_image(&candidates.main_images).await;
        let additional_images = self
            .pick_additional_images(&candidates.gallery, &main_image)
            .await;

        Some(ProductFields {
            title: candidates.title,
            description: candidates.description,
            specs: candidates.specs,
            specs_html: candidates.specs_html,
            price: candidates.price,
            main_image,
            additional_images,
            video_links: candidates.videos,
        })
    }

    fn collect(&self, html: &str, page_url: &str, model: &ModelIdentifier) -> Option<PageCandidates> {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url).ok();

        let title = self.title(&document)?;
        let (specs, specs_html) = self.specs(&document);

        Some(PageCandidates {
            title,
            price: self.price(&document),
            main_images: self.main_image_candidates(&document, base.as_ref(), model),
            gallery: self.gallery_candidates(&document, base.as_ref()),
            description: self.description(&document),
            specs,
            specs_html,
            videos: self.videos(&document, base.as_ref()),
        })
    }

    fn title(&self, document: &Html) -> Option<String> {
        self.rules.title.iter().find_map(|selector| {
            document
                .select(selector)
                .map(element_text)
                .find(|text| !text.is_empty())
        })
    }

    fn price(&self, document: &Html) -> String {
        // The primary price block is trusted regardless of formatting
        for selector in self.rules.price_primary.iter() {
            for element in document.select(selector) {
                let price = extract_price(&element_text(element));
                if !price.is_empty() {
                    return price;
                }
            }
        }

        for selector in self.rules.price_fallback.iter() {
            for element in document.select(selector) {
                let text = element_text(element);
                if !looks_like_price(&text) {
                    continue;
                }
                let price = extract_price(&text);
                if !price.is_empty() {
                    return price;
                }
            }
        }

        String::new()
    }

    fn main_image_candidates(
        &self,
        document: &Html,
        base: Option<&Url>,
        model: &ModelIdentifier,
    ) -> Vec<String> {
        let mut candidates = Vec::new();

        // Every match of every selector, in order, until one is large enough
        for selector in self.rules.main_image.iter() {
            for img in document.select(selector) {
                if let Some(src) = img.value().attr("src") {
                    push_unique(&mut candidates, resolve(base, src));
                }
            }
        }

        // Any image whose path mentions the model or a product
        let needle = model.as_str().to_lowercase();
        for img in document.select(&self.rules.all_images) {
            let Some(src) = img.value().attr("src") else {
                continue;
            };
            let lower = src.to_lowercase();
            if lower.contains(&needle) || lower.contains("product") {
                push_unique(&mut candidates, resolve(base, src));
            }
        }

        candidates
    }

    fn gallery_candidates(&self, document: &Html, base: Option<&Url>) -> Vec<String> {
        let mut candidates = Vec::new();
        for selector in self.rules.additional_images.iter() {
            for img in document.select(selector) {
                if let Some(src) = img.value().attr("src") {
                    let src = src.replace("thumbnail", "full");
                    push_unique(&mut candidates, resolve(base, &src));
                }
            }
        }
        candidates
    }

    async fn pick_main_image(&self, candidates: &[String]) -> String {
        for url in candidates {
            if self.probe.meets_min_size(url).await {
                return url.clone();
            }
            debug!("Rejected main image candidate {}", url);
        }
        String::new()
    }

    async fn pick_additional_images(&self, candidates: &[String], main_image: &str) -> Vec<String> {
        let mut images: Vec<String> = Vec::new();
        for url in candidates {
            if images.len() >= self.max_images {
                break;
            }
            if url == main_image || images.contains(url) {
                continue;
            }
            if self.probe.meets_min_size(url).await {
                images.push(url.clone());
            }
        }
        images
    }

    /// 描述只取第一个标签页容器中的段落；容器存在时不再使用备用选择器，
    /// 即使过滤后没有剩下任何段落
    fn description(&self, document: &Html) -> String {
        if let Some(tabs) = document.select(&self.rules.description_tabs).next() {
            return tabs
                .select(&self.rules.paragraphs)
                .filter(|p| {
                    let text = element_text(*p).to_lowercase();
                    !text.is_empty() && !text.starts_with("*free") && !text.contains("video")
                })
                .filter_map(|p| wrap_paragraph(&p.inner_html()))
                .collect::<Vec<_>>()
                .concat();
        }

        // Only the first element of each fallback selector is considered
        self.rules
            .description_fallback
            .iter()
            .find_map(|selector| {
                document
                    .select(selector)
                    .next()
                    .and_then(|element| wrap_paragraph(&element.inner_html()))
            })
            .unwrap_or_default()
    }

    fn specs(&self, document: &Html) -> (SpecTable, String) {
        let mut builder = SpecsBuilder::default();

        let table = first_match(document, &self.rules.specs_tables);
        if let Some(table) = table {
            for row in table.select(&self.rules.table_rows) {
                let cells: Vec<ElementRef> = row.select(&self.rules.table_cells).collect();
                if let [key, value, ..] = cells.as_slice() {
                    builder.push(&element_text(*key), &element_text(*value), &value.inner_html());
                }
            }
        } else {
            for row in document.select(&self.rules.spec_rows) {
                let key = row.select(&self.rules.spec_key).next();
                let value = row.select(&self.rules.spec_value).next();
                if let (Some(key), Some(value)) = (key, value) {
                    builder.push(&element_text(key), &element_text(value), &value.inner_html());
                }
            }
        }

        builder.finish()
    }

    fn videos(&self, document: &Html, base: Option<&Url>) -> Vec<String> {
        let mut links = self.collect_sources(document, base, &self.rules.videos);
        if links.is_empty() {
            links = self.collect_sources(document, base, &self.rules.nested_videos);
        }
        links.truncate(self.max_videos);
        links
    }

    fn collect_sources(&self, document: &Html, base: Option<&Url>, chain: &CompiledChain) -> Vec<String> {
        let mut links = Vec::new();
        for selector in chain.iter() {
            for source in document.select(selector) {
                if let Some(src) = source.value().attr("src") {
                    push_unique(&mut links, resolve(base, src));
                }
            }
        }
        links
    }
}

/// 规格表构造器
///
/// 映射键统一小写，HTML 保留原始大小写；重复键只保留第一次出现的行。
#[derive(Default)]
struct SpecsBuilder {
    table: SpecTable,
    rows: Vec<String>,
}

impl SpecsBuilder {
    fn push(&mut self, display_key: &str, value_text: &str, value_html: &str) {
        if display_key.is_empty() {
            return;
        }
        let key = display_key.to_lowercase();

        // The rendered cell keeps the page's own markup, weights included
        let cell = strip_images(value_html).trim().to_string();
        let value = if key.contains("weight") {
            normalize_weight(value_text)
        } else {
            value_text.to_string()
        };

        if self.table.insert(key, value) {
            self.rows.push(format!(
                r#"<tr><td style="padding:3px 8px;"><b>{}</b></td><td style="padding:3px 8px;">{}</td></tr>"#,
                html_escape::encode_text(display_key),
                cell
            ));
        }
    }

    fn finish(self) -> (SpecTable, String) {
        if self.rows.is_empty() {
            return (self.table, String::new());
        }
        let html = format!("{}{}{}", SPECS_TABLE_OPEN, self.rows.concat(), SPECS_TABLE_CLOSE);
        (self.table, html)
    }
}

fn first_match<'a>(document: &'a Html, chain: &CompiledChain) -> Option<ElementRef<'a>> {
    chain
        .iter()
        .find_map(|selector| document.select(selector).next())
}

fn element_text(element: ElementRef) -> String {
    clean_text(&element.text().collect::<String>())
}

fn wrap_paragraph(inner_html: &str) -> Option<String> {
    let inner = strip_images(inner_html);
    let inner = inner.trim();
    if inner.is_empty() {
        None
    } else {
        Some(format!("<p>{}</p>", inner))
    }
}

/// 相对地址按页面地址解析，`data:` 地址和空地址丢弃
fn resolve(base: Option<&Url>, src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") {
        return None;
    }
    match base {
        Some(base) => base.join(src).ok().map(|u| u.to_string()),
        None => Some(src.to_string()),
    }
}

fn push_unique(list: &mut Vec<String>, url: Option<String>) {
    if let Some(url) = url {
        if !list.contains(&url) {
            list.push(url);
        }
    }
}
