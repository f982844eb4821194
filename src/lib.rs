//! # Journal Subscription
//!
//! 学术期刊订阅推送：从 Crossref 抓取新文章，经 LLM 翻译后写入 Notion 工作区
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 只负责传输和状态码，不含业务判断
//! - `CrossrefClient` - 文献元数据查询
//! - `NotionClient` - 数据库查询、页面创建与更新
//! - `LlmClient` - 单轮问答（OpenAI 兼容接口）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `MetadataFetcher` - 抓取并规范化文章
//! - `Enricher` - 翻译、动机/方法提取、每期小结
//! - `NotionWorkspace` - 读写订阅表、文章库、小结库
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个订阅"的完整处理流程
//! - `JournalProcessor` - fetch → enrich → write → summarize → status
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/run_controller` - 读取订阅列表，顺序处理并统计
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod testing;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Article, IssueSummary, Subscription};
pub use orchestrator::{App, RunSummary};
pub use workflow::{JournalProcessor, ProcessOutcome};
