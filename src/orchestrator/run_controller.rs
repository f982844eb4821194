//! 运行控制器 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：根据配置创建各个客户端，注入到服务和流程中
//! 2. **加载订阅**：从订阅表读取所有启用的订阅
//! 3. **顺序处理**：逐个订阅交给 JournalProcessor，单个订阅失败不影响其他订阅
//! 4. **全局统计**：汇总所有订阅的处理结果
//!
//! 本模块不做具体业务判断，只做调度和统计。

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::{CrossrefClient, LanguageModel, LlmClient, NotionClient};
use crate::config::Config;
use crate::error::AppResult;
use crate::services::{ArticleSource, Enricher, MetadataFetcher, NotionWorkspace, WorkspaceStore};
use crate::utils::logging::{log_startup, log_subscriptions_loaded, print_final_stats};
use crate::workflow::{JournalProcessor, ProcessOutcome};

/// 一次运行的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// 启用的订阅数
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub articles_written: usize,
    pub summaries_written: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &ProcessOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.articles_written += outcome.articles_written();
        self.summaries_written += outcome.summaries_written();
    }
}

/// 应用主结构
pub struct App {
    store: Arc<dyn WorkspaceStore>,
    processor: JournalProcessor,
    model_name: String,
}

impl App {
    /// 根据配置初始化应用
    pub fn new(config: &Config) -> Self {
        let store: Arc<dyn WorkspaceStore> = Arc::new(NotionWorkspace::new(
            NotionClient::new(&config.notion),
            &config.notion,
        ));
        let source: Arc<dyn ArticleSource> =
            Arc::new(MetadataFetcher::new(CrossrefClient::new(&config.crossref)));
        let llm: Arc<dyn LanguageModel> = Arc::new(LlmClient::new(&config.llm));

        Self::from_parts(store, source, llm)
    }

    /// 使用已构造好的依赖组装应用
    pub fn from_parts(
        store: Arc<dyn WorkspaceStore>,
        source: Arc<dyn ArticleSource>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        let model_name = llm.model_name().to_string();
        let processor = JournalProcessor::new(source, Enricher::new(llm), store.clone());
        Self {
            store,
            processor,
            model_name,
        }
    }

    /// 运行一次完整的推送，以本地日期为"今天"
    pub async fn run(&self) -> AppResult<RunSummary> {
        self.run_on(chrono::Local::now().date_naive()).await
    }

    /// 以指定日期为"今天"运行
    ///
    /// 订阅表读取失败时返回错误，此时不处理任何订阅
    pub async fn run_on(&self, today: NaiveDate) -> AppResult<RunSummary> {
        log_startup(&self.model_name);

        info!("\n📁 正在读取订阅列表...");
        let subscriptions = self.store.list_enabled_subscriptions().await.map_err(|e| {
            error!("❌ 读取订阅列表失败: {}", e);
            e
        })?;

        let mut summary = RunSummary {
            total: subscriptions.len(),
            ..Default::default()
        };

        if subscriptions.is_empty() {
            warn!("⚠️ 没有启用的订阅，程序结束");
            return Ok(summary);
        }
        log_subscriptions_loaded(subscriptions.len());

        for (idx, subscription) in subscriptions.iter().enumerate() {
            info!("\n{}", "─".repeat(60));
            info!("📦 [{}/{}] {}", idx + 1, subscriptions.len(), subscription.journal);

            let outcome = self.processor.process(subscription, today).await;
            if outcome.is_success() {
                info!("✓ {} {}", subscription, outcome);
            } else {
                warn!("❌ {} {}", subscription, outcome);
            }
            summary.record(&outcome);
        }

        print_final_stats(
            summary.succeeded,
            summary.failed,
            summary.articles_written,
            summary.summaries_written,
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeModel, FakeSource, FakeStore};

    #[test]
    fn test_run_summary_record() {
        let mut summary = RunSummary::default();
        summary.record(&ProcessOutcome::MissingIssn);
        summary.record(&ProcessOutcome::NoNewArticles);
        summary.record(&ProcessOutcome::Pushed {
            fetched: 4,
            written: 3,
            summaries: 1,
        });

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.articles_written, 3);
        assert_eq!(summary.summaries_written, 1);
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_run() {
        let source = Arc::new(FakeSource::empty());
        let app = App::from_parts(
            Arc::new(FakeStore::failing_listing()),
            source.clone(),
            Arc::new(FakeModel::failing()),
        );

        let result = app.run_on(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).await;

        assert!(result.is_err());
        assert!(source.fetches().is_empty());
    }

    #[tokio::test]
    async fn test_empty_subscription_list() {
        let app = App::from_parts(
            Arc::new(FakeStore::new()),
            Arc::new(FakeSource::empty()),
            Arc::new(FakeModel::failing()),
        );

        let summary = app
            .run_on(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(summary, RunSummary::default());
    }
}
