//! 期刊处理流程 - 流程层
//!
//! 核心职责：定义"一个订阅"的完整处理流程
//!
//! 流程顺序：
//! 1. 确定 ISSN（Online 优先）→ 缺失则记录错误并结束
//! 2. 确定起始日期（水位日期，缺省为 30 天前）
//! 3. 抓取文章 → 无文章则记录"无新文章"并推进水位
//! 4. 逐篇翻译 + 写入（单篇失败不影响其他文章）
//! 5. 按 (卷, 期) 分组生成小结
//! 6. 记录推送数量并推进水位

use chrono::{Duration, NaiveDate};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::models::{Article, IssueSummary, Subscription};
use crate::services::{ArticleSource, Enricher, WorkspaceStore};
use crate::utils::logging::truncate_text;

/// 没有水位日期时向前回溯的天数
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// 单个订阅的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Online / Print ISSN 都为空
    MissingIssn,
    /// 整体抓取失败
    FetchFailed { reason: String },
    /// 区间内没有新文章
    NoNewArticles,
    /// 处理完成
    Pushed {
        fetched: usize,
        written: usize,
        summaries: usize,
    },
}

impl ProcessOutcome {
    /// 写入订阅表"最近处理状态"的文本
    pub fn status_text(&self) -> String {
        match self {
            ProcessOutcome::MissingIssn => "错误：缺少ISSN".to_string(),
            ProcessOutcome::FetchFailed { reason } => format!("错误：抓取失败（{}）", reason),
            ProcessOutcome::NoNewArticles => "成功：无新文章".to_string(),
            ProcessOutcome::Pushed { written, .. } => format!("成功：推送{}篇文章", written),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ProcessOutcome::NoNewArticles | ProcessOutcome::Pushed { .. }
        )
    }

    /// 成功时推进水位，失败时保持不变
    pub fn watermark(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.is_success().then_some(today)
    }

    pub fn articles_written(&self) -> usize {
        match self {
            ProcessOutcome::Pushed { written, .. } => *written,
            _ => 0,
        }
    }

    pub fn summaries_written(&self) -> usize {
        match self {
            ProcessOutcome::Pushed { summaries, .. } => *summaries,
            _ => 0,
        }
    }
}

impl Display for ProcessOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.status_text())
    }
}

/// 同一期的文章
#[derive(Debug)]
pub struct IssueGroup<'a> {
    pub volume: &'a str,
    pub issue: &'a str,
    pub articles: Vec<&'a Article>,
}

/// 按 (卷, 期) 分组，保持首次出现的顺序；卷或期为空的文章不参与分组
pub fn group_by_issue(articles: &[Article]) -> Vec<IssueGroup<'_>> {
    let mut groups: Vec<IssueGroup<'_>> = Vec::new();

    for article in articles {
        let (volume, issue) = article.issue_key();
        if volume.trim().is_empty() || issue.trim().is_empty() {
            continue;
        }
        match groups
            .iter_mut()
            .find(|g| g.volume == volume && g.issue == issue)
        {
            Some(group) => group.articles.push(article),
            None => groups.push(IssueGroup {
                volume,
                issue,
                articles: vec![article],
            }),
        }
    }

    groups
}

/// 抓取起始日期
pub fn resolve_start_date(subscription: &Subscription, today: NaiveDate) -> NaiveDate {
    subscription
        .watermark()
        .unwrap_or_else(|| today - Duration::days(DEFAULT_LOOKBACK_DAYS))
}

/// 期刊处理流程
///
/// 依赖通过构造函数注入，不持有全局状态
pub struct JournalProcessor {
    source: Arc<dyn ArticleSource>,
    enricher: Enricher,
    store: Arc<dyn WorkspaceStore>,
}

impl JournalProcessor {
    pub fn new(
        source: Arc<dyn ArticleSource>,
        enricher: Enricher,
        store: Arc<dyn WorkspaceStore>,
    ) -> Self {
        Self {
            source,
            enricher,
            store,
        }
    }

    /// 处理单个订阅，并把结果写回订阅表
    ///
    /// 不返回错误：所有失败都体现在 [`ProcessOutcome`] 和日志中
    pub async fn process(&self, subscription: &Subscription, today: NaiveDate) -> ProcessOutcome {
        let outcome = self.run(subscription, today).await;
        self.record_status(subscription, &outcome, today).await;
        outcome
    }

    async fn run(&self, subscription: &Subscription, today: NaiveDate) -> ProcessOutcome {
        let Some(issn) = subscription.issn() else {
            warn!("{} 缺少ISSN，跳过", subscription);
            return ProcessOutcome::MissingIssn;
        };

        let from = resolve_start_date(subscription, today);
        info!("\n{} 开始处理 (ISSN: {})", subscription, issn);
        info!("{} 抓取日期: {} 至 {}", subscription, from, today);

        let articles = match self.source.fetch(issn, from, today).await {
            Ok(articles) => articles,
            Err(e) => {
                error!("{} 抓取ISSN {} 文章失败: {}", subscription, issn, e);
                return ProcessOutcome::FetchFailed {
                    reason: e.kind().to_string(),
                };
            }
        };

        if articles.is_empty() {
            info!("{} 未找到新文章", subscription);
            return ProcessOutcome::NoNewArticles;
        }

        info!("{} 找到 {} 篇文章", subscription, articles.len());

        let written = self.push_articles(subscription, &articles, today).await;
        info!(
            "{} 成功推送 {}/{} 篇文章",
            subscription,
            written,
            articles.len()
        );

        let summaries = self.push_summaries(subscription, &articles, today).await;

        ProcessOutcome::Pushed {
            fetched: articles.len(),
            written,
            summaries,
        }
    }

    /// 逐篇翻译并写入，返回写入成功的数量
    async fn push_articles(
        &self,
        subscription: &Subscription,
        articles: &[Article],
        today: NaiveDate,
    ) -> usize {
        let mut written = 0;

        for article in articles {
            info!("  处理: {}", truncate_text(&article.title, 50));

            let enrichment = self
                .enricher
                .enrich(&article.title, &article.abstract_text)
                .await;
            let enriched = article.clone().with_enrichment(enrichment);

            match self.store.create_article_record(&enriched, today).await {
                Ok(()) => written += 1,
                Err(e) => {
                    error!(
                        "{} 写入文章失败 ({}): {}",
                        subscription,
                        truncate_text(&article.title, 50),
                        e
                    );
                }
            }
        }

        written
    }

    /// 按期生成并写入小结，返回写入成功的数量
    async fn push_summaries(
        &self,
        subscription: &Subscription,
        articles: &[Article],
        today: NaiveDate,
    ) -> usize {
        let mut written = 0;

        for group in group_by_issue(articles) {
            info!(
                "  生成小结: Volume {}, Issue {}",
                group.volume, group.issue
            );

            let summary_text = self.enricher.summarize(&group.articles).await;
            let summary = IssueSummary {
                journal: subscription.journal.clone(),
                volume: group.volume.to_string(),
                issue: group.issue.to_string(),
                year: group.articles.first().and_then(|a| a.year),
                article_count: group.articles.len(),
                summary: summary_text,
            };

            match self.store.create_issue_summary_record(&summary, today).await {
                Ok(()) => written += 1,
                Err(e) => error!(
                    "{} 写入小结失败 (Volume {}, Issue {}): {}",
                    subscription, group.volume, group.issue, e
                ),
            }
        }

        written
    }

    async fn record_status(
        &self,
        subscription: &Subscription,
        outcome: &ProcessOutcome,
        today: NaiveDate,
    ) {
        let status = outcome.status_text();
        if let Err(e) = self
            .store
            .update_subscription_status(
                &subscription.id,
                &status,
                today,
                outcome.watermark(today),
            )
            .await
        {
            error!("{} 更新订阅状态失败: {}", subscription, e);
        }
    }
}
