//! 文献元数据服务 - 业务能力层
//!
//! 只负责"按 ISSN 抓取新文章"能力，把 Crossref 原始记录转换为 [`Article`]

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::clients::crossref_client::MAX_ROWS;
use crate::clients::CrossrefClient;
use crate::error::ApiError;
use crate::models::{Article, CrossrefWork};

/// 文章来源
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// 抓取 `[from, until]` 区间内出版的文章
    ///
    /// 单条记录解析失败时跳过该条；整体请求失败时返回错误
    async fn fetch(
        &self,
        issn: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Article>, ApiError>;
}

/// 基于 Crossref 的文章来源
///
/// 每次最多取前 100 条，不做分页
pub struct MetadataFetcher {
    client: CrossrefClient,
}

impl MetadataFetcher {
    pub fn new(client: CrossrefClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArticleSource for MetadataFetcher {
    async fn fetch(
        &self,
        issn: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Article>, ApiError> {
        let response = self
            .client
            .works_by_issn(issn, from, until, MAX_ROWS)
            .await?;

        let total = response.message.total_results;
        if total > u64::from(MAX_ROWS) {
            warn!(
                "ISSN {} 共有 {} 条记录，本次只处理前 {} 条",
                issn, total, MAX_ROWS
            );
        }

        let articles = parse_items(response.message.items);
        debug!("ISSN {} 解析得到 {} 篇文章", issn, articles.len());
        Ok(articles)
    }
}

/// 逐条解析原始记录，失败的记录记录日志后跳过
pub fn parse_items(items: Vec<serde_json::Value>) -> Vec<Article> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let parsed = serde_json::from_value::<CrossrefWork>(item)
                .map_err(|e| e.to_string())
                .and_then(|work| work.into_article().map_err(|e| e.to_string()));

            match parsed {
                Ok(article) => Some(article),
                Err(e) => {
                    warn!("解析文章数据失败 (第 {} 条): {}", index + 1, e);
                    None
                }
            }
        })
        .collect()
}
