//! 测试替身
//!
//! 为 [`LanguageModel`]、[`ArticleSource`]、[`WorkspaceStore`] 提供内存实现，
//! 记录所有调用供断言使用

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::clients::LanguageModel;
use crate::error::{ApiError, LlmError};
use crate::models::{Article, IssueSummary, Subscription};
use crate::services::{ArticleSource, WorkspaceStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ========== LanguageModel ==========

/// 固定回复或固定失败的模型
pub struct FakeModel {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// 收到的所有提示词
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    fn model_name(&self) -> &str {
        "fake-model"
    }

    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        lock(&self.prompts).push(prompt.to_string());
        match &self.reply {
            Some(reply) => Ok(reply.trim().to_string()),
            None => Err(LlmError::Request {
                model: "fake-model".to_string(),
                message: "simulated failure".to_string(),
            }),
        }
    }
}

// ========== ArticleSource ==========

/// 一次抓取调用
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFetch {
    pub issn: String,
    pub from: NaiveDate,
    pub until: NaiveDate,
}

/// 返回预设文章的来源
pub struct FakeSource {
    articles: Vec<Article>,
    fail: bool,
    fetches: Mutex<Vec<RecordedFetch>>,
}

impl FakeSource {
    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            articles,
            fail: false,
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_articles(Vec::new())
    }

    pub fn failing() -> Self {
        Self {
            articles: Vec::new(),
            fail: true,
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn fetches(&self) -> Vec<RecordedFetch> {
        lock(&self.fetches).clone()
    }
}

#[async_trait]
impl ArticleSource for FakeSource {
    async fn fetch(
        &self,
        issn: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Article>, ApiError> {
        lock(&self.fetches).push(RecordedFetch {
            issn: issn.to_string(),
            from,
            until,
        });
        if self.fail {
            return Err(ApiError::Unknown {
                endpoint: "/works".to_string(),
                status: Some(503),
                message: "simulated outage".to_string(),
            });
        }
        Ok(self.articles.clone())
    }
}

// ========== WorkspaceStore ==========

/// 一次状态更新
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatus {
    pub subscription_id: String,
    pub status: String,
    pub processed_on: NaiveDate,
    pub watermark: Option<NaiveDate>,
}

/// 内存工作区
#[derive(Default)]
pub struct FakeStore {
    subscriptions: Vec<Subscription>,
    fail_listing: bool,
    /// 标题在此集合中的文章写入失败
    failing_titles: HashSet<String>,
    fail_summaries: bool,
    articles: Mutex<Vec<Article>>,
    summaries: Mutex<Vec<IssueSummary>>,
    statuses: Mutex<Vec<RecordedStatus>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriptions(subscriptions: Vec<Subscription>) -> Self {
        Self {
            subscriptions,
            ..Self::default()
        }
    }

    pub fn failing_listing() -> Self {
        Self {
            fail_listing: true,
            ..Self::default()
        }
    }

    pub fn fail_article(mut self, title: &str) -> Self {
        self.failing_titles.insert(title.to_string());
        self
    }

    pub fn fail_summaries(mut self) -> Self {
        self.fail_summaries = true;
        self
    }

    pub fn articles(&self) -> Vec<Article> {
        lock(&self.articles).clone()
    }

    pub fn summaries(&self) -> Vec<IssueSummary> {
        lock(&self.summaries).clone()
    }

    pub fn statuses(&self) -> Vec<RecordedStatus> {
        lock(&self.statuses).clone()
    }
}

fn rejected(endpoint: &str) -> ApiError {
    ApiError::from_status(endpoint, 400, "simulated validation error")
}

#[async_trait]
impl WorkspaceStore for FakeStore {
    async fn list_enabled_subscriptions(&self) -> Result<Vec<Subscription>, ApiError> {
        if self.fail_listing {
            return Err(ApiError::from_status("/v1/databases/subs/query", 401, "bad token"));
        }
        Ok(self
            .subscriptions
            .iter()
            .filter(|s| s.enabled)
            .cloned()
            .collect())
    }

    async fn create_article_record(
        &self,
        article: &Article,
        _uploaded_on: NaiveDate,
    ) -> Result<(), ApiError> {
        if self.failing_titles.contains(&article.title) {
            return Err(rejected("/v1/pages"));
        }
        lock(&self.articles).push(article.clone());
        Ok(())
    }

    async fn create_issue_summary_record(
        &self,
        summary: &IssueSummary,
        _generated_on: NaiveDate,
    ) -> Result<(), ApiError> {
        if self.fail_summaries {
            return Err(rejected("/v1/pages"));
        }
        lock(&self.summaries).push(summary.clone());
        Ok(())
    }

    async fn update_subscription_status(
        &self,
        subscription_id: &str,
        status: &str,
        processed_on: NaiveDate,
        watermark: Option<NaiveDate>,
    ) -> Result<(), ApiError> {
        lock(&self.statuses).push(RecordedStatus {
            subscription_id: subscription_id.to_string(),
            status: status.to_string(),
            processed_on,
            watermark,
        });
        Ok(())
    }
}
