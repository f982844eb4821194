use serde::{Deserialize, Serialize};

/// 一篇期刊文章
///
/// 由 Crossref 的单条记录转换而来，写入文章推送库后不再修改
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub journal: String,
    pub volume: String,
    pub issue: String,
    pub year: Option<i32>,
    /// `YYYY-MM`，只有年份时为 `YYYY`
    pub year_month: String,
    /// `{year}Q{n}`
    pub quarter: String,
    /// 前 3 位作者，超过 3 位时追加 " et al."
    pub author: String,
    pub abstract_text: String,
    pub url: String,
    pub doi: String,
    /// `YYYY[-MM[-DD]]`
    pub publication_date: Option<String>,

    // --- LLM 生成字段 ---
    pub title_cn: String,
    pub abstract_cn: String,
    pub motivation: String,
    pub method: String,
}

impl Article {
    /// 合并 LLM 生成的翻译与摘要
    pub fn with_enrichment(mut self, enrichment: Enrichment) -> Self {
        self.title_cn = enrichment.title_cn;
        self.abstract_cn = enrichment.abstract_cn;
        self.motivation = enrichment.motivation;
        self.method = enrichment.method;
        self
    }

    /// 所属期号，用于按期分组
    pub fn issue_key(&self) -> (&str, &str) {
        (self.volume.as_str(), self.issue.as_str())
    }
}

/// LLM 翻译与提取结果
///
/// 字段名与提示词中要求的 JSON 键一致
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    pub title_cn: String,
    pub abstract_cn: String,
    pub motivation: String,
    pub method: String,
}

impl Enrichment {
    /// 调用失败时的兜底结果：原文直接透传
    pub fn passthrough(title: &str, abstract_text: &str) -> Self {
        Self {
            title_cn: title.to_string(),
            abstract_cn: abstract_text.to_string(),
            motivation: String::new(),
            method: String::new(),
        }
    }
}

/// 某一期的小结
#[derive(Debug, Clone, PartialEq)]
pub struct IssueSummary {
    pub journal: String,
    pub volume: String,
    pub issue: String,
    pub year: Option<i32>,
    pub article_count: usize,
    pub summary: String,
}
