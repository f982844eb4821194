//! Crossref `/works` 响应结构
//!
//! 只声明查询时 `select` 的字段，进入业务层前立即转换为 [`Article`]

use serde::Deserialize;
use thiserror::Error;

use super::article::Article;

/// 查询时请求返回的字段
pub const SELECT_FIELDS: &[&str] = &[
    "DOI",
    "title",
    "author",
    "abstract",
    "published-print",
    "published-online",
    "volume",
    "issue",
    "URL",
    "container-title",
];

/// 作者列表中最多展示的人数
const MAX_LISTED_AUTHORS: usize = 3;

#[derive(Debug, Deserialize)]
pub struct WorksResponse {
    #[serde(default)]
    pub status: String,
    pub message: WorksMessage,
}

#[derive(Debug, Deserialize)]
pub struct WorksMessage {
    /// 逐条解析，单条记录格式错误不影响整批
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(rename = "total-results", default)]
    pub total_results: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrossrefWork {
    #[serde(rename = "DOI", default)]
    pub doi: String,
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub author: Vec<CrossrefAuthor>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    pub published_print: Option<PartialDate>,
    pub published_online: Option<PartialDate>,
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub issue: String,
    #[serde(rename = "URL")]
    pub url: Option<String>,
    #[serde(default)]
    pub container_title: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrossrefAuthor {
    #[serde(default)]
    pub given: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    /// 机构作者只有 name
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialDate {
    #[serde(rename = "date-parts", default)]
    pub date_parts: Vec<Vec<Option<i64>>>,
}

/// 单条记录转换失败
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("非法月份: {0}")]
    InvalidMonth(i64),
    #[error("非法日期: {0}")]
    InvalidDay(i64),
    #[error("非法年份: {0}")]
    InvalidYear(i64),
}

/// 年月日，月和日可能缺失
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishedOn {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PublishedOn {
    /// `YYYY-MM` 或 `YYYY`
    pub fn year_month(&self) -> String {
        match self.month {
            Some(m) => format!("{}-{:02}", self.year, m),
            None => self.year.to_string(),
        }
    }

    /// 保留日信息的完整日期
    pub fn full(&self) -> String {
        match (self.month, self.day) {
            (Some(m), Some(d)) => format!("{}-{:02}-{:02}", self.year, m, d),
            _ => self.year_month(),
        }
    }

    /// 缺少月份时记为第一季度
    pub fn quarter(&self) -> String {
        let q = self.month.map(|m| (m - 1) / 3 + 1).unwrap_or(1);
        format!("{}Q{}", self.year, q)
    }
}

impl PartialDate {
    fn parse(&self) -> Result<Option<PublishedOn>, RecordError> {
        let parts = match self.date_parts.first() {
            Some(parts) => parts,
            None => return Ok(None),
        };
        let year = match parts.first().copied().flatten() {
            Some(y) => i32::try_from(y).map_err(|_| RecordError::InvalidYear(y))?,
            None => return Ok(None),
        };
        let month = match parts.get(1).copied().flatten() {
            Some(m) if (1..=12).contains(&m) => Some(m as u32),
            Some(m) => return Err(RecordError::InvalidMonth(m)),
            None => None,
        };
        let day = match parts.get(2).copied().flatten() {
            Some(d) if (1..=31).contains(&d) => Some(d as u32),
            Some(d) => return Err(RecordError::InvalidDay(d)),
            None => None,
        };
        Ok(Some(PublishedOn { year, month, day }))
    }
}

impl CrossrefWork {
    /// 纸质版出版日期优先，其次网络版
    pub fn published_on(&self) -> Result<Option<PublishedOn>, RecordError> {
        if let Some(print) = &self.published_print {
            if let Some(date) = print.parse()? {
                return Ok(Some(date));
            }
        }
        match &self.published_online {
            Some(online) => online.parse(),
            None => Ok(None),
        }
    }

    /// "Given Family, Given Family, Given Family et al."
    pub fn author_line(&self) -> String {
        let names: Vec<String> = self
            .author
            .iter()
            .take(MAX_LISTED_AUTHORS)
            .map(CrossrefAuthor::display_name)
            .collect();

        let mut line = names.join(", ");
        if self.author.len() > MAX_LISTED_AUTHORS {
            line.push_str(" et al.");
        }
        line
    }

    /// 记录自带 URL，否则由 DOI 拼出
    pub fn canonical_url(&self) -> String {
        match &self.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ if !self.doi.is_empty() => format!("https://doi.org/{}", self.doi),
            _ => String::new(),
        }
    }

    /// 转换为业务层的文章记录
    pub fn into_article(self) -> Result<Article, RecordError> {
        let published = self.published_on()?;
        let author = self.author_line();
        let url = self.canonical_url();

        Ok(Article {
            title: self.title.into_iter().next().unwrap_or_default(),
            journal: self.container_title.into_iter().next().unwrap_or_default(),
            volume: self.volume,
            issue: self.issue,
            year: published.map(|p| p.year),
            year_month: published.map(|p| p.year_month()).unwrap_or_default(),
            quarter: published.map(|p| p.quarter()).unwrap_or_default(),
            author,
            abstract_text: self.abstract_text.unwrap_or_default(),
            url,
            doi: self.doi,
            publication_date: published.map(|p| p.full()),
            ..Default::default()
        })
    }
}

impl CrossrefAuthor {
    pub fn display_name(&self) -> String {
        let given = self.given.as_deref().unwrap_or("");
        let family = self.family.as_deref().unwrap_or("");
        let joined = format!("{} {}", given, family).trim().to_string();
        if joined.is_empty() {
            self.name.clone().unwrap_or_default()
        } else {
            joined
        }
    }
}
