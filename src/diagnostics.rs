//! 配置检查
//!
//! 逐项验证工作区 token、三个数据库、LLM 和 Crossref 是否可用，
//! 供 `check_config` 使用。检查本身不会返回错误，结果全部体现在 [`CheckResult`] 中。

use chrono::NaiveDate;
use std::fmt::Write as _;

use crate::clients::{CrossrefClient, LanguageModel, LlmClient, NotionClient};
use crate::config::{Config, DEFAULT_LLM_BASE_URL};
use crate::error::ApiError;

/// Crossref 检查使用的期刊（Nature Genetics）
const PROBE_ISSN: &str = "1546-1718";
const PROBE_MAX_TOKENS: u32 = 10;

/// 单项检查结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            detail: detail.into(),
        }
    }
}

/// 待检查的依赖
pub struct Probes<'a> {
    pub notion: &'a NotionClient,
    pub llm: &'a dyn LanguageModel,
    pub crossref: &'a CrossrefClient,
}

/// 按配置创建客户端并执行全部检查
pub async fn run_all(config: &Config) -> Vec<CheckResult> {
    let notion = NotionClient::new(&config.notion);
    let llm = LlmClient::new(&config.llm);
    let crossref = CrossrefClient::new(&config.crossref);

    run_checks(
        config,
        Probes {
            notion: &notion,
            llm: &llm,
            crossref: &crossref,
        },
    )
    .await
}

/// 执行全部检查
///
/// token 检查失败时跳过数据库检查，三个数据库记为失败
pub async fn run_checks(config: &Config, probes: Probes<'_>) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let notion_ok = if config.notion.api_key.is_empty() {
        results.push(CheckResult::fail("notion_api", "未配置 Notion API Key"));
        false
    } else {
        let result = check_notion_token(probes.notion).await;
        let passed = result.passed;
        results.push(result);
        passed
    };

    let databases = [
        ("notion_db_subscriptions", "期刊订阅表", &config.notion.subscriptions_db),
        ("notion_db_articles", "文章推送库", &config.notion.articles_db),
        ("notion_db_summaries", "期刊小结库", &config.notion.summaries_db),
    ];
    for (name, label, database_id) in databases {
        let result = if !notion_ok {
            CheckResult::fail(name, "跳过（Notion API 不可用）")
        } else if database_id.is_empty() {
            CheckResult::fail(name, format!("未配置 {} ID", label))
        } else {
            check_database(probes.notion, name, label, database_id).await
        };
        results.push(result);
    }

    results.push(if config.llm.api_key.is_empty() {
        CheckResult::fail("llm_api", "未配置 LLM API Key")
    } else {
        check_llm(probes.llm).await
    });

    results.push(check_crossref(probes.crossref).await);

    results
}

async fn check_notion_token(notion: &NotionClient) -> CheckResult {
    const NAME: &str = "notion_api";
    match notion.ping().await {
        Ok(()) => CheckResult::pass(NAME, "Notion API 连接成功"),
        Err(ApiError::Unauthorized { .. }) => CheckResult::fail(NAME, "Notion API Key 无效"),
        Err(e) => CheckResult::fail(NAME, format!("Notion API 错误: {}", e)),
    }
}

async fn check_database(
    notion: &NotionClient,
    name: &str,
    label: &str,
    database_id: &str,
) -> CheckResult {
    match notion.query_database(database_id, None, Some(1)).await {
        Ok(_) => CheckResult::pass(name, format!("{} 连接成功", label)),
        Err(ApiError::NotFound { .. }) => CheckResult::fail(
            name,
            format!(
                "找不到 {}（可能未添加 integration 连接）。提示: 在 Notion 数据库页面点击 '...' → 'Add connections' → 选择你的 integration",
                label
            ),
        ),
        Err(ApiError::Unauthorized { .. }) => {
            CheckResult::fail(name, format!("{} 权限不足", label))
        }
        Err(e) => CheckResult::fail(name, format!("{} 错误: {}", label, e)),
    }
}

async fn check_llm(llm: &dyn LanguageModel) -> CheckResult {
    const NAME: &str = "llm_api";
    match llm.complete("Hi", PROBE_MAX_TOKENS).await {
        Ok(_) => CheckResult::pass(NAME, format!("LLM 连接成功（{}）", llm.model_name())),
        Err(e) => CheckResult::fail(NAME, format!("LLM 错误: {}", e)),
    }
}

async fn check_crossref(crossref: &CrossrefClient) -> CheckResult {
    const NAME: &str = "crossref_api";
    let from = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default();
    let until = chrono::Local::now().date_naive();
    match crossref.works_by_issn(PROBE_ISSN, from, until, 1).await {
        Ok(_) => CheckResult::pass(NAME, "Crossref API 连接成功"),
        Err(e) => CheckResult::fail(NAME, format!("Crossref API 错误: {}", e)),
    }
}

/// 凭证格式提示（不影响检查结果）
pub fn key_warnings(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    let notion_key = &config.notion.api_key;
    if !notion_key.is_empty() && !notion_key.starts_with("secret_") && !notion_key.starts_with("ntn_") {
        warnings.push("Notion API Key 格式可能不正确（应该以 'secret_' 或 'ntn_' 开头）".to_string());
    }

    let llm_key = &config.llm.api_key;
    if config.llm.base_url != DEFAULT_LLM_BASE_URL {
        warnings.push(format!(
            "使用自定义 API 端点: {}（模型: {}）",
            config.llm.base_url, config.llm.model
        ));
    } else if !llm_key.is_empty() && !llm_key.starts_with("sk-ant-") {
        warnings.push("LLM API Key 格式可能不正确（官方应该以 'sk-ant-' 开头）".to_string());
    }

    warnings
}

pub fn all_passed(results: &[CheckResult]) -> bool {
    results.iter().all(|r| r.passed)
}

/// 渲染结果表
pub fn render_table(results: &[CheckResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "测试结果总结");
    let _ = writeln!(out, "{}", "=".repeat(60));
    for result in results {
        let status = if result.passed { "✅ 通过" } else { "❌ 失败" };
        let _ = writeln!(out, "{} - {}: {}", status, result.name, result.detail);
    }
    out
}
