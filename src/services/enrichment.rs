//! 翻译与摘要服务 - 业务能力层
//!
//! 只负责调用 LLM 生成中文翻译、研究动机/方法提取和每期小结。
//! 所有方法都不返回错误：LLM 调用失败或返回格式错误时退化为原文透传或模板文本。

use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

use crate::clients::LanguageModel;
use crate::models::{Article, Enrichment};
use crate::utils::logging::truncate_text;

/// 小结最多参考的文章数
pub const SUMMARY_MAX_ARTICLES: usize = 10;
/// 小结中每篇摘要截取的字符数
const SUMMARY_ABSTRACT_CHARS: usize = 200;

const TITLE_MAX_TOKENS: u32 = 500;
const ENRICH_MAX_TOKENS: u32 = 2000;
const SUMMARY_MAX_TOKENS: u32 = 500;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*(?:```.*)?$").expect("代码块正则无效")
});

/// 翻译与摘要服务
pub struct Enricher {
    llm: Arc<dyn LanguageModel>,
}

impl Enricher {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// 翻译标题和摘要，并提取研究动机与研究方法
    ///
    /// 没有摘要时只翻译标题
    pub async fn enrich(&self, title: &str, abstract_text: &str) -> Enrichment {
        if abstract_text.trim().is_empty() {
            return self.translate_title(title).await;
        }

        let prompt = build_enrich_prompt(title, abstract_text);
        let response = match self.llm.complete(&prompt, ENRICH_MAX_TOKENS).await {
            Ok(text) => text,
            Err(e) => {
                warn!("LLM 翻译失败，使用原文: {}", e);
                return Enrichment::passthrough(title, abstract_text);
            }
        };

        match parse_enrichment(&response) {
            Ok(enrichment) => enrichment,
            Err(e) => {
                warn!("LLM 返回的 JSON 无法解析，使用原文: {}", e);
                debug!("LLM 原始响应: {}", truncate_text(&response, 200));
                Enrichment::passthrough(title, abstract_text)
            }
        }
    }

    async fn translate_title(&self, title: &str) -> Enrichment {
        let prompt = build_title_prompt(title);
        match self.llm.complete(&prompt, TITLE_MAX_TOKENS).await {
            Ok(title_cn) => Enrichment {
                title_cn,
                ..Default::default()
            },
            Err(e) => {
                warn!("LLM 标题翻译失败，使用原文: {}", e);
                Enrichment::passthrough(title, "")
            }
        }
    }

    /// 为同一期的文章生成小结
    ///
    /// 只参考前 10 篇（保持抓取顺序），兜底文本中的篇数也按参考的篇数计
    pub async fn summarize(&self, articles: &[&Article]) -> String {
        let sample = &articles[..articles.len().min(SUMMARY_MAX_ARTICLES)];
        let prompt = build_summary_prompt(sample);

        match self.llm.complete(&prompt, SUMMARY_MAX_TOKENS).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("生成小结失败: {}", e);
                fallback_summary(sample.len())
            }
        }
    }
}

/// 去掉 Markdown 代码块包裹（含可选的语言标记）
///
/// 只取第一个代码块的内容，闭合标记之后的文字丢弃
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed)
}

/// 解析 LLM 返回的 JSON，四个字段缺一不可
pub fn parse_enrichment(response: &str) -> Result<Enrichment, serde_json::Error> {
    serde_json::from_str(strip_code_fence(response))
}

pub fn fallback_summary(article_count: usize) -> String {
    format!("本期共收录{}篇文章。", article_count)
}

// ========== 提示词 ==========

fn build_title_prompt(title: &str) -> String {
    format!(
        r#"请将以下英文标题翻译成中文：

标题：{}

要求：
1. 翻译准确、符合学术规范
2. 直接输出中文标题，不要其他内容"#,
        title
    )
}

fn build_enrich_prompt(title: &str, abstract_text: &str) -> String {
    format!(
        r#"请完成以下任务：

1. 将标题翻译成中文
2. 将摘要翻译成中文
3. 从摘要中提取研究动机和问题（2-3句话概括）
4. 从摘要中提取研究方法（2-3句话概括）

标题：{}

摘要：{}

请按以下JSON格式输出：
{{
  "title_cn": "中文标题",
  "abstract_cn": "中文摘要",
  "motivation": "研究动机和问题",
  "method": "研究方法"
}}

只输出JSON，不要其他内容。"#,
        title, abstract_text
    )
}

fn build_summary_prompt(articles: &[&Article]) -> String {
    let mut digest = String::new();
    for (i, article) in articles.iter().enumerate() {
        digest.push_str(&format!("\n{}. {}\n", i + 1, article.title));
        if !article.abstract_text.is_empty() {
            let head: String = article
                .abstract_text
                .chars()
                .take(SUMMARY_ABSTRACT_CHARS)
                .collect();
            digest.push_str(&format!("   摘要：{}...\n", head));
        }
    }

    format!(
        r#"请为这一期期刊撰写一份小结（150-200字），内容包括：

1. 本期文章的主要研究主题和方向
2. 使用的主要研究方法
3. 整体研究趋势或特点

本期文章列表：{}

要求：
- 简洁概括，突出重点
- 客观中立
- 直接输出小结文本，不要前缀和标题"#,
        digest
    )
}
