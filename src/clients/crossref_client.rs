/// Crossref API 客户端
///
/// 按 ISSN 和出版日期区间查询 `/works`，返回未解析的记录列表
use crate::config::CrossrefConfig;
use crate::error::{retry_after_secs, ApiError};
use crate::models::crossref::{WorksResponse, SELECT_FIELDS};
use chrono::NaiveDate;
use reqwest::Client;
use tracing::debug;

/// 每次查询最多返回的记录数，不做分页
pub const MAX_ROWS: u32 = 100;

const USER_AGENT: &str = concat!(
    "journal_subscription/",
    env!("CARGO_PKG_VERSION"),
    " (reqwest)"
);

/// Crossref API 客户端
pub struct CrossrefClient {
    http: Client,
    base_url: String,
    mailto: Option<String>,
}

impl CrossrefClient {
    pub fn new(config: &CrossrefConfig) -> Self {
        let mut client = Self::with_base_url(&config.base_url);
        client.mailto = config.mailto.clone();
        client
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            mailto: None,
        }
    }

    /// 查询某个 ISSN 在日期区间内出版的文章
    ///
    /// # 参数
    /// - `issn`: 期刊 ISSN
    /// - `from`: 起始出版日期（含）
    /// - `until`: 截止出版日期（含）
    /// - `rows`: 最多返回条数
    pub async fn works_by_issn(
        &self,
        issn: &str,
        from: NaiveDate,
        until: NaiveDate,
        rows: u32,
    ) -> Result<WorksResponse, ApiError> {
        let endpoint = "/works";
        let filter = format!(
            "issn:{},from-pub-date:{},until-pub-date:{}",
            issn,
            from.format("%Y-%m-%d"),
            until.format("%Y-%m-%d")
        );

        let mut query: Vec<(&str, String)> = vec![
            ("filter", filter),
            ("rows", rows.to_string()),
            ("select", SELECT_FIELDS.join(",")),
        ];
        if let Some(mailto) = &self.mailto {
            query.push(("mailto", mailto.clone()));
        }

        debug!("Crossref 查询: {:?}", query);

        let response = self
            .http
            .get(format!("{}{}", self.base_url, endpoint))
            .header("User-Agent", USER_AGENT)
            .query(&query)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(
                ApiError::from_status(endpoint, status.as_u16(), body).with_retry_after(retry_after)
            );
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(endpoint, e))?;
        serde_json::from_str(&text).map_err(|e| ApiError::malformed(endpoint, e.to_string()))
    }
}
