//! 工作区存储服务 - 业务能力层
//!
//! 把订阅表、文章推送库、期刊小结库三个 Notion 数据库的读写封装为
//! [`WorkspaceStore`]，属性名与人工维护的数据库保持一致

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use crate::clients::NotionClient;
use crate::config::NotionConfig;
use crate::error::ApiError;
use crate::models::notion::{parse_notion_date, Filter, Page, Properties, PropertyValue};
use crate::models::{Article, IssueSummary, Subscription};

/// 订阅表属性名
pub mod subscription_props {
    pub const JOURNAL: &str = "Journal";
    pub const ONLINE_ISSN: &str = "Online ISSN";
    pub const PRINT_ISSN: &str = "Print ISSN";
    pub const START_DATE: &str = "起始抓取日期";
    pub const LAST_UPDATE: &str = "最后更新日期";
    pub const ENABLED: &str = "是否启用订阅";
    pub const LAST_PROCESSED: &str = "最近处理日期";
    pub const LAST_STATUS: &str = "最近处理状态";
}

/// 文章推送库属性名
pub mod article_props {
    pub const TITLE: &str = "Title";
    pub const TITLE_CN: &str = "标题";
    pub const JOURNAL: &str = "Journal";
    pub const VOLUME: &str = "Volume";
    pub const ISSUE: &str = "Issue";
    pub const YEAR: &str = "Year";
    pub const YEAR_MONTH: &str = "Year-Month";
    pub const QUARTER: &str = "YearQuarter";
    pub const AUTHOR: &str = "Author";
    pub const ABSTRACT: &str = "Abstract";
    pub const ABSTRACT_CN: &str = "摘要";
    pub const MOTIVATION: &str = "研究动机和问题";
    pub const METHOD: &str = "研究方法";
    pub const LINK: &str = "Link";
    pub const UPLOADED: &str = "上传日期";
}

/// 期刊小结库属性名
pub mod summary_props {
    pub const JOURNAL: &str = "Journal";
    pub const VOLUME: &str = "Volume";
    pub const ISSUE: &str = "Issue";
    pub const YEAR: &str = "Year";
    pub const ARTICLE_COUNT: &str = "文章数量";
    pub const SUMMARY: &str = "小结";
    pub const GENERATED: &str = "小结生成日期";
}

/// 工作区读写能力
///
/// 每次写入都是独立的远程调用，没有事务
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    /// 读取所有启用的订阅
    async fn list_enabled_subscriptions(&self) -> Result<Vec<Subscription>, ApiError>;

    /// 写入一篇文章，`uploaded_on` 为上传日期
    async fn create_article_record(
        &self,
        article: &Article,
        uploaded_on: NaiveDate,
    ) -> Result<(), ApiError>;

    /// 写入一期小结，`generated_on` 为小结生成日期
    async fn create_issue_summary_record(
        &self,
        summary: &IssueSummary,
        generated_on: NaiveDate,
    ) -> Result<(), ApiError>;

    /// 更新订阅的处理状态
    ///
    /// 总是写入最近处理日期和状态文本；`watermark` 不为空时同时推进最后更新日期
    async fn update_subscription_status(
        &self,
        subscription_id: &str,
        status: &str,
        processed_on: NaiveDate,
        watermark: Option<NaiveDate>,
    ) -> Result<(), ApiError>;
}

/// 基于 Notion 的工作区
pub struct NotionWorkspace {
    client: NotionClient,
    subscriptions_db: String,
    articles_db: String,
    summaries_db: String,
}

impl NotionWorkspace {
    pub fn new(client: NotionClient, config: &NotionConfig) -> Self {
        Self {
            client,
            subscriptions_db: config.subscriptions_db.clone(),
            articles_db: config.articles_db.clone(),
            summaries_db: config.summaries_db.clone(),
        }
    }
}

#[async_trait]
impl WorkspaceStore for NotionWorkspace {
    async fn list_enabled_subscriptions(&self) -> Result<Vec<Subscription>, ApiError> {
        let filter = Filter::checkbox_equals(subscription_props::ENABLED, true);
        let pages = self
            .client
            .query_database(&self.subscriptions_db, Some(filter), None)
            .await?;
        Ok(pages.iter().map(subscription_from_page).collect())
    }

    async fn create_article_record(
        &self,
        article: &Article,
        uploaded_on: NaiveDate,
    ) -> Result<(), ApiError> {
        let props = article_properties(article, uploaded_on);
        self.client.create_page(&self.articles_db, &props).await
    }

    async fn create_issue_summary_record(
        &self,
        summary: &IssueSummary,
        generated_on: NaiveDate,
    ) -> Result<(), ApiError> {
        let props = summary_properties(summary, generated_on);
        self.client.create_page(&self.summaries_db, &props).await
    }

    async fn update_subscription_status(
        &self,
        subscription_id: &str,
        status: &str,
        processed_on: NaiveDate,
        watermark: Option<NaiveDate>,
    ) -> Result<(), ApiError> {
        let props = status_properties(status, processed_on, watermark);
        self.client.update_page(subscription_id, &props).await
    }
}

// ========== 属性转换 ==========

/// 订阅表页面 -> 订阅
pub fn subscription_from_page(page: &Page) -> Subscription {
    use subscription_props::*;

    let journal = page.title_text(JOURNAL);
    let read_date = |name: &str| {
        let raw = page.date_start(name)?;
        let parsed = parse_notion_date(&raw);
        if parsed.is_none() {
            warn!("[期刊 {}] 无法解析日期属性 {}: {}", journal, name, raw);
        }
        parsed
    };

    Subscription {
        id: page.id.clone(),
        journal: journal.clone(),
        online_issn: page.rich_text(ONLINE_ISSN),
        print_issn: page.rich_text(PRINT_ISSN),
        start_date: read_date(START_DATE),
        last_update: read_date(LAST_UPDATE),
        enabled: page.checkbox(ENABLED),
    }
}

/// 文章 -> 文章推送库属性，文本字段截断到 2000 字符
pub fn article_properties(article: &Article, uploaded_on: NaiveDate) -> Properties {
    use article_props::*;

    let mut props = Properties::new();
    let mut put = |name: &str, value: PropertyValue| {
        props.insert(name.to_string(), value);
    };
    put(TITLE, PropertyValue::title(&article.title));
    put(TITLE_CN, PropertyValue::rich_text(&article.title_cn));
    put(JOURNAL, PropertyValue::rich_text(&article.journal));
    put(VOLUME, PropertyValue::rich_text(&article.volume));
    put(ISSUE, PropertyValue::rich_text(&article.issue));
    put(YEAR, PropertyValue::number(article.year));
    put(YEAR_MONTH, PropertyValue::rich_text(&article.year_month));
    put(QUARTER, PropertyValue::rich_text(&article.quarter));
    put(AUTHOR, PropertyValue::rich_text(&article.author));
    put(ABSTRACT, PropertyValue::rich_text(&article.abstract_text));
    put(ABSTRACT_CN, PropertyValue::rich_text(&article.abstract_cn));
    put(MOTIVATION, PropertyValue::rich_text(&article.motivation));
    put(METHOD, PropertyValue::rich_text(&article.method));
    put(LINK, PropertyValue::url(&article.url));
    put(UPLOADED, PropertyValue::date(uploaded_on));
    props
}

/// 小结 -> 期刊小结库属性
pub fn summary_properties(summary: &IssueSummary, generated_on: NaiveDate) -> Properties {
    use summary_props::*;

    let mut props = Properties::new();
    let mut put = |name: &str, value: PropertyValue| {
        props.insert(name.to_string(), value);
    };
    put(JOURNAL, PropertyValue::title(&summary.journal));
    put(VOLUME, PropertyValue::rich_text(&summary.volume));
    put(ISSUE, PropertyValue::rich_text(&summary.issue));
    put(YEAR, PropertyValue::number(summary.year));
    put(
        ARTICLE_COUNT,
        PropertyValue::Number(Some(summary.article_count as f64)),
    );
    put(SUMMARY, PropertyValue::rich_text(&summary.summary));
    put(GENERATED, PropertyValue::date(generated_on));
    props
}

/// 订阅状态更新属性
pub fn status_properties(
    status: &str,
    processed_on: NaiveDate,
    watermark: Option<NaiveDate>,
) -> Properties {
    use subscription_props::*;

    let mut props = Properties::new();
    props.insert(LAST_PROCESSED.to_string(), PropertyValue::date(processed_on));
    props.insert(LAST_STATUS.to_string(), PropertyValue::rich_text(status));
    if let Some(date) = watermark {
        props.insert(LAST_UPDATE.to_string(), PropertyValue::date(date));
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn notion_config(base_url: &str) -> NotionConfig {
        NotionConfig {
            api_key: "ntn_test".to_string(),
            subscriptions_db: "subs".to_string(),
            articles_db: "arts".to_string(),
            summaries_db: "sums".to_string(),
            base_url: base_url.to_string(),
        }
    }

    fn workspace(server: &Server) -> NotionWorkspace {
        let config = notion_config(&server.url());
        NotionWorkspace::new(NotionClient::new(&config), &config)
    }

    #[test]
    fn test_article_properties_truncates_text() {
        let article = Article {
            title: "T".repeat(2500),
            abstract_text: "摘".repeat(2001),
            year: Some(2024),
            volume: "56".to_string(),
            ..Default::default()
        };
        let props = serde_json::to_value(article_properties(&article, date(2024, 5, 1))).unwrap();

        let title = props["Title"]["title"][0]["text"]["content"].as_str().unwrap();
        assert_eq!(title.chars().count(), 2000);
        let abs = props["Abstract"]["rich_text"][0]["text"]["content"].as_str().unwrap();
        assert_eq!(abs.chars().count(), 2000);

        assert_eq!(props["Year"], json!({"number": 2024.0}));
        assert_eq!(props["Link"], json!({"url": null}));
        assert_eq!(props["上传日期"], json!({"date": {"start": "2024-05-01"}}));
        assert_eq!(props["Volume"]["rich_text"][0]["text"]["content"], "56");
    }

    #[test]
    fn test_summary_properties() {
        let summary = IssueSummary {
            journal: "Nature Genetics".to_string(),
            volume: "56".to_string(),
            issue: "8".to_string(),
            year: None,
            article_count: 7,
            summary: "小结".to_string(),
        };
        let props = serde_json::to_value(summary_properties(&summary, date(2024, 8, 9))).unwrap();
        assert_eq!(props["Journal"]["title"][0]["text"]["content"], "Nature Genetics");
        assert_eq!(props["文章数量"], json!({"number": 7.0}));
        assert_eq!(props["Year"], json!({"number": null}));
        assert_eq!(props["小结生成日期"], json!({"date": {"start": "2024-08-09"}}));
    }

    #[test]
    fn test_status_properties_watermark_optional() {
        let without = status_properties("错误：缺少ISSN", date(2024, 1, 2), None);
        assert_eq!(without.len(), 2);
        assert!(!without.contains_key(subscription_props::LAST_UPDATE));

        let with = status_properties("成功：推送3篇文章", date(2024, 1, 2), Some(date(2024, 1, 2)));
        assert_eq!(with.len(), 3);
        assert_eq!(
            with.get(subscription_props::LAST_UPDATE),
            Some(&PropertyValue::date(date(2024, 1, 2)))
        );
    }

    #[tokio::test]
    async fn test_list_enabled_subscriptions() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/databases/subs/query")
            .match_body(Matcher::PartialJson(json!({
                "filter": {"property": "是否启用订阅", "checkbox": {"equals": true}}
            })))
            .with_status(200)
            .with_body(
                json!({"results": [{
                    "id": "page-1",
                    "properties": {
                        "Journal": {"type": "title", "title": [{"plain_text": "Cell"}]},
                        "Online ISSN": {"type": "rich_text", "rich_text": []},
                        "Print ISSN": {"type": "rich_text", "rich_text": [{"plain_text": "0092-8674"}]},
                        "起始抓取日期": {"type": "date", "date": {"start": "2024-03-01"}},
                        "最后更新日期": {"type": "date", "date": {"start": "not-a-date"}},
                        "是否启用订阅": {"type": "checkbox", "checkbox": true}
                    }
                }]})
                .to_string(),
            )
            .create_async()
            .await;

        let subs = workspace(&server).list_enabled_subscriptions().await.unwrap();
        mock.assert_async().await;

        assert_eq!(subs.len(), 1);
        let sub = &subs[0];
        assert_eq!(sub.id, "page-1");
        assert_eq!(sub.journal, "Cell");
        assert_eq!(sub.issn(), Some("0092-8674"));
        assert_eq!(sub.start_date, Some(date(2024, 3, 1)));
        assert_eq!(sub.last_update, None);
        assert!(sub.enabled);
    }

    #[tokio::test]
    async fn test_update_subscription_status_stamps_processing_date() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/v1/pages/page-1")
            .match_body(Matcher::Json(json!({
                "properties": {
                    "最近处理日期": {"date": {"start": "2024-02-29"}},
                    "最近处理状态": {"rich_text": [{"text": {"content": "成功：无新文章"}}]},
                    "最后更新日期": {"date": {"start": "2024-02-29"}}
                }
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        workspace(&server)
            .update_subscription_status(
                "page-1",
                "成功：无新文章",
                date(2024, 2, 29),
                Some(date(2024, 2, 29)),
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_article_record_failure_is_reported() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/pages")
            .with_status(400)
            .with_body(r#"{"code":"validation_error"}"#)
            .create_async()
            .await;

        let err = workspace(&server)
            .create_article_record(&Article::default(), date(2024, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unknown { status: Some(400), .. }));
    }

    #[tokio::test]
    async fn test_create_summary_record_uses_generation_date() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/pages")
            .match_body(Matcher::PartialJson(json!({
                "parent": {"database_id": "sums"},
                "properties": {"小结生成日期": {"date": {"start": "2023-12-31"}}}
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let summary = IssueSummary {
            journal: "Cell".to_string(),
            volume: "187".to_string(),
            issue: "1".to_string(),
            year: Some(2023),
            article_count: 3,
            summary: "小结".to_string(),
        };
        workspace(&server)
            .create_issue_summary_record(&summary, date(2023, 12, 31))
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
