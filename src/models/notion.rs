//! Notion API 请求 / 响应结构
//!
//! 写入用 [`PropertyValue`]（外部标签枚举，序列化结果与 Notion 的属性格式一致），
//! 读取用 [`PropertyRead`]（Notion 返回的属性带有 `id` / `type` 等额外字段）

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Notion rich_text 单段内容的长度上限
pub const MAX_TEXT_CHARS: usize = 2000;

/// 按字符截断
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

// ========== 写入 ==========

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Number(Option<f64>),
    Date(Option<DateValue>),
    Url(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RichText {
    pub text: TextContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateValue {
    pub start: String,
}

impl PropertyValue {
    pub fn title(text: &str) -> Self {
        PropertyValue::Title(vec![RichText::new(text)])
    }

    pub fn rich_text(text: &str) -> Self {
        PropertyValue::RichText(vec![RichText::new(text)])
    }

    pub fn number<N: Into<f64>>(value: Option<N>) -> Self {
        PropertyValue::Number(value.map(Into::into))
    }

    pub fn date(date: NaiveDate) -> Self {
        PropertyValue::Date(Some(DateValue {
            start: date.format("%Y-%m-%d").to_string(),
        }))
    }

    /// 空字符串写为 null，Notion 不接受空 URL
    pub fn url(url: &str) -> Self {
        if url.is_empty() {
            PropertyValue::Url(None)
        } else {
            PropertyValue::Url(Some(truncate_chars(url, MAX_TEXT_CHARS)))
        }
    }
}

impl RichText {
    /// 内容超过上限时截断
    pub fn new(content: &str) -> Self {
        Self {
            text: TextContent {
                content: truncate_chars(content, MAX_TEXT_CHARS),
            },
        }
    }
}

/// 属性名 -> 属性值，BTreeMap 保证序列化顺序稳定
pub type Properties = BTreeMap<String, PropertyValue>;

#[derive(Debug, Serialize)]
pub struct CreatePageRequest<'a> {
    pub parent: Parent<'a>,
    pub properties: &'a Properties,
}

#[derive(Debug, Serialize)]
pub struct Parent<'a> {
    pub database_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct UpdatePageRequest<'a> {
    pub properties: &'a Properties,
}

#[derive(Debug, Default, Serialize)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// 单个属性过滤条件，目前只用到 checkbox
#[derive(Debug, Clone, Serialize)]
pub struct Filter {
    pub property: String,
    pub checkbox: CheckboxFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckboxFilter {
    pub equals: bool,
}

impl Filter {
    pub fn checkbox_equals(property: &str, equals: bool) -> Self {
        Self {
            property: property.to_string(),
            checkbox: CheckboxFilter { equals },
        }
    }
}

// ========== 读取 ==========

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Page>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyRead>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyRead {
    #[serde(default)]
    pub title: Option<Vec<RichTextRead>>,
    #[serde(default)]
    pub rich_text: Option<Vec<RichTextRead>>,
    #[serde(default)]
    pub date: Option<DateRead>,
    #[serde(default)]
    pub checkbox: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichTextRead {
    #[serde(default)]
    pub plain_text: Option<String>,
    #[serde(default)]
    pub text: Option<TextRead>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextRead {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRead {
    #[serde(default)]
    pub start: Option<String>,
}

impl RichTextRead {
    fn as_str(&self) -> &str {
        self.plain_text
            .as_deref()
            .or_else(|| self.text.as_ref().map(|t| t.content.as_str()))
            .unwrap_or("")
    }
}

fn join_segments(segments: &[RichTextRead]) -> String {
    segments.iter().map(RichTextRead::as_str).collect()
}

impl Page {
    fn property(&self, name: &str) -> Option<&PropertyRead> {
        self.properties.get(name)
    }

    pub fn title_text(&self, name: &str) -> String {
        self.property(name)
            .and_then(|p| p.title.as_deref())
            .map(join_segments)
            .unwrap_or_default()
    }

    pub fn rich_text(&self, name: &str) -> String {
        self.property(name)
            .and_then(|p| p.rich_text.as_deref())
            .map(join_segments)
            .unwrap_or_default()
    }

    /// 日期属性的起始值，原样返回字符串
    pub fn date_start(&self, name: &str) -> Option<String> {
        self.property(name)
            .and_then(|p| p.date.as_ref())
            .and_then(|d| d.start.clone())
    }

    pub fn checkbox(&self, name: &str) -> bool {
        self.property(name).and_then(|p| p.checkbox).unwrap_or(false)
    }
}

/// 解析 Notion 日期，兼容带时间的格式（取前 10 个字符）
pub fn parse_notion_date(value: &str) -> Option<NaiveDate> {
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
