//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 读取订阅列表，逐个交给流程层处理，输出全局统计。
//!
//! ## 层次关系
//!
//! ```text
//! run_controller::App (处理 Vec<Subscription>)
//!     ↓
//! workflow::JournalProcessor (处理单个 Subscription)
//!     ↓
//! services (能力层：fetch / enrich / store)
//!     ↓
//! clients (基础设施：Crossref / Notion / LLM)
//! ```

pub mod run_controller;

pub use run_controller::{App, RunSummary};
