//! 程序配置
//!
//! 配置来源（按优先级）：
//! 1. `JOURNAL_CONFIG` 环境变量指定的文件
//! 2. 当前目录下的 `config.toml`
//! 3. 当前目录下的 `config.json`
//! 4. 环境变量

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_CROSSREF_BASE_URL: &str = "https://api.crossref.org";

/// 程序配置
///
/// `llm` 段也接受旧版配置中的 `anthropic` 段
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub notion: NotionConfig,
    #[serde(alias = "anthropic")]
    pub llm: LlmConfig,
    #[serde(default)]
    pub crossref: CrossrefConfig,
}

/// Notion 工作区配置
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "RawNotionConfig")]
pub struct NotionConfig {
    /// Integration token
    pub api_key: String,
    /// 期刊订阅表
    pub subscriptions_db: String,
    /// 文章推送库
    pub articles_db: String,
    /// 期刊小结库
    pub summaries_db: String,
    pub base_url: String,
}

/// 文件中的 Notion 配置，数据库 ID 可以平铺，也可以放在 `databases` 下
#[derive(Deserialize)]
struct RawNotionConfig {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    subscriptions_db: String,
    #[serde(default)]
    articles_db: String,
    #[serde(default)]
    summaries_db: String,
    #[serde(default)]
    databases: DatabaseIds,
    #[serde(default = "default_notion_base_url")]
    base_url: String,
}

#[derive(Default, Deserialize)]
struct DatabaseIds {
    #[serde(default)]
    subscriptions: String,
    #[serde(default)]
    articles: String,
    #[serde(default)]
    summaries: String,
}

impl From<RawNotionConfig> for NotionConfig {
    /// 平铺的字段优先
    fn from(raw: RawNotionConfig) -> Self {
        let pick = |flat: String, nested: String| if flat.is_empty() { nested } else { flat };
        Self {
            api_key: raw.api_key,
            subscriptions_db: pick(raw.subscriptions_db, raw.databases.subscriptions),
            articles_db: pick(raw.articles_db, raw.databases.articles),
            summaries_db: pick(raw.summaries_db, raw.databases.summaries),
            base_url: raw.base_url,
        }
    }
}

/// LLM 配置（兼容 OpenAI API 的服务）
#[derive(Clone, Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
}

/// Crossref 配置
#[derive(Clone, Debug, Deserialize)]
pub struct CrossrefConfig {
    #[serde(default = "default_crossref_base_url")]
    pub base_url: String,
    /// 填写后请求会进入 Crossref 的 polite pool
    #[serde(default)]
    pub mailto: Option<String>,
}

impl Default for CrossrefConfig {
    fn default() -> Self {
        Self {
            base_url: default_crossref_base_url(),
            mailto: None,
        }
    }
}

fn default_notion_base_url() -> String {
    DEFAULT_NOTION_BASE_URL.to_string()
}

fn default_llm_base_url() -> String {
    DEFAULT_LLM_BASE_URL.to_string()
}

fn default_llm_model() -> String {
    DEFAULT_LLM_MODEL.to_string()
}

fn default_crossref_base_url() -> String {
    DEFAULT_CROSSREF_BASE_URL.to_string()
}

impl Default for Config {
    /// 凭证为空，端点和模型取默认值
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// 按优先级查找配置文件，找不到时使用环境变量
    ///
    /// 不校验凭证，见 [`Config::validate`]
    pub fn load() -> Result<Self, ConfigError> {
        match Self::locate_file() {
            Some(path) => {
                info!("📋 使用配置文件: {}", path.display());
                Self::from_file(&path)
            }
            None => {
                info!("📋 未找到配置文件，使用环境变量");
                Ok(Self::from_env())
            }
        }
    }

    /// 加载并校验配置，缺少凭证时返回错误
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    fn locate_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("JOURNAL_CONFIG") {
            return Some(PathBuf::from(path));
        }
        ["config.toml", "config.json"]
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }

    /// 从文件加载配置，按扩展名选择 JSON 或 TOML
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: display.clone(),
            source,
        })?;

        let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| ConfigError::ParseFailed {
            path: display,
            message,
        })
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// `LLM_*` 未设置时回退到旧版的 `ANTHROPIC_*` 变量
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).unwrap_or_default();
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(*name))
                .find(|v| !v.is_empty())
        };
        Self {
            notion: NotionConfig {
                api_key: var("NOTION_API_KEY"),
                subscriptions_db: var("NOTION_DB_SUBSCRIPTIONS"),
                articles_db: var("NOTION_DB_ARTICLES"),
                summaries_db: var("NOTION_DB_SUMMARIES"),
                base_url: lookup("NOTION_API_BASE_URL")
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(default_notion_base_url),
            },
            llm: LlmConfig {
                api_key: first(&["LLM_API_KEY", "ANTHROPIC_API_KEY"]).unwrap_or_default(),
                base_url: first(&["LLM_API_BASE_URL", "ANTHROPIC_BASE_URL"])
                    .unwrap_or_else(default_llm_base_url),
                model: first(&["LLM_MODEL_NAME", "ANTHROPIC_MODEL"])
                    .unwrap_or_else(default_llm_model),
            },
            crossref: CrossrefConfig {
                base_url: default_crossref_base_url(),
                mailto: lookup("CROSSREF_MAILTO").filter(|v| !v.is_empty()),
            },
        }
    }

    /// 校验必需的凭证
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notion.api_key.trim().is_empty() {
            return Err(ConfigError::missing("NOTION_API_KEY"));
        }
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::missing("LLM_API_KEY"));
        }
        Ok(())
    }
}
