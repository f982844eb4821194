/// Notion API 客户端
///
/// 封装查询数据库、创建页面、更新页面三个调用，只处理传输和状态码
use crate::config::NotionConfig;
use crate::error::{retry_after_secs, ApiError};
use crate::models::notion::{
    CreatePageRequest, Filter, Page, Parent, Properties, QueryRequest, QueryResponse,
    UpdatePageRequest,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

pub const NOTION_VERSION: &str = "2022-06-28";

/// Notion API 客户端
pub struct NotionClient {
    http: Client,
    base_url: String,
    token: String,
}

impl NotionClient {
    /// 创建新的 Notion 客户端
    pub fn new(config: &NotionConfig) -> Self {
        Self::with_base_url(&config.base_url, &config.api_key)
    }

    pub fn with_base_url(base_url: &str, token: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// 查询数据库
    ///
    /// # 参数
    /// - `database_id`: 数据库 ID
    /// - `filter`: 过滤条件（可选）
    /// - `page_size`: 每页条数（可选，不传时由 Notion 决定）
    pub async fn query_database(
        &self,
        database_id: &str,
        filter: Option<Filter>,
        page_size: Option<u32>,
    ) -> Result<Vec<Page>, ApiError> {
        let endpoint = format!("/v1/databases/{}/query", database_id);
        let body = QueryRequest { filter, page_size };

        let response = self.send(&endpoint, self.post(&endpoint).json(&body)).await?;
        let parsed: QueryResponse = Self::decode(&endpoint, response).await?;

        debug!("查询数据库 {} 返回 {} 条记录", database_id, parsed.results.len());
        Ok(parsed.results)
    }

    /// 在数据库中创建页面
    pub async fn create_page(
        &self,
        database_id: &str,
        properties: &Properties,
    ) -> Result<(), ApiError> {
        let endpoint = "/v1/pages";
        let body = CreatePageRequest {
            parent: Parent { database_id },
            properties,
        };
        self.send(endpoint, self.post(endpoint).json(&body)).await?;
        Ok(())
    }

    /// 更新页面属性
    pub async fn update_page(&self, page_id: &str, properties: &Properties) -> Result<(), ApiError> {
        let endpoint = format!("/v1/pages/{}", page_id);
        let body = UpdatePageRequest { properties };
        let request = self
            .http
            .patch(self.url(&endpoint))
            .headers_for(&self.token)
            .json(&body);
        self.send(&endpoint, request).await?;
        Ok(())
    }

    /// 验证 token 是否可用（search 接口，只取 1 条）
    pub async fn ping(&self) -> Result<(), ApiError> {
        let endpoint = "/v1/search";
        self.send(endpoint, self.post(endpoint).json(&json!({ "page_size": 1 })))
            .await?;
        Ok(())
    }

    // ========== 辅助函数 ==========

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        self.http.post(self.url(endpoint)).headers_for(&self.token)
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(endpoint, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = retry_after_secs(response.headers());
        let body = response.text().await.unwrap_or_default();
        debug!("Notion 返回错误 {} ({}): {}", status, endpoint, body);
        Err(ApiError::from_status(endpoint, status.as_u16(), body).with_retry_after(retry_after))
    }

    async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, ApiError> {
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(endpoint, e))?;
        serde_json::from_str(&text).map_err(|e| ApiError::malformed(endpoint, e.to_string()))
    }
}

trait NotionHeaders {
    fn headers_for(self, token: &str) -> Self;
}

impl NotionHeaders for RequestBuilder {
    fn headers_for(self, token: &str) -> Self {
        self.bearer_auth(token)
            .header("Notion-Version", NOTION_VERSION)
            .header("Content-Type", "application/json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notion::PropertyValue;
    use mockito::{Matcher, Server};
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_query_database_sends_filter_and_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/databases/db1/query")
            .match_header("authorization", "Bearer ntn_token")
            .match_header("notion-version", NOTION_VERSION)
            .match_body(Matcher::Json(json!({
                "filter": {"property": "是否启用订阅", "checkbox": {"equals": true}}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"results": [{"id": "p1", "properties": {}}]}).to_string())
            .create_async()
            .await;

        let client = NotionClient::with_base_url(&server.url(), "ntn_token");
        let pages = client
            .query_database("db1", Some(Filter::checkbox_equals("是否启用订阅", true)), None)
            .await
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, "p1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_page_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/pages")
            .match_body(Matcher::Json(json!({
                "parent": {"database_id": "articles"},
                "properties": {"Title": {"title": [{"text": {"content": "T"}}]}}
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = NotionClient::with_base_url(&server.url(), "t");
        let mut props = Properties::new();
        props.insert("Title".to_string(), PropertyValue::title("T"));
        assert_ok!(client.create_page("articles", &props).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_page_uses_patch() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/v1/pages/page-9")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = NotionClient::with_base_url(&server.url(), "t");
        let props = Properties::new();
        assert_ok!(client.update_page("page-9", &props).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/databases/missing/query")
            .with_status(404)
            .with_body(r#"{"code":"object_not_found"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/v1/search")
            .with_status(401)
            .with_body(r#"{"code":"unauthorized"}"#)
            .create_async()
            .await;

        let client = NotionClient::with_base_url(&server.url(), "bad");
        let err = client.query_database("missing", None, Some(1)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));

        let err = client.ping().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let mut server = Server::new_async().await;
        server
            .mock("PATCH", "/v1/pages/page-1")
            .with_status(429)
            .with_header("Retry-After", "12")
            .with_body(r#"{"code":"rate_limited"}"#)
            .create_async()
            .await;

        let client = NotionClient::with_base_url(&server.url(), "ntn_test");
        let err = client
            .update_page("page-1", &Properties::new())
            .await
            .unwrap_err();
        match err {
            ApiError::RateLimited { retry_after, .. } => assert_eq!(retry_after, Some(12)),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_query_response() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/databases/db/query")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = NotionClient::with_base_url(&server.url(), "t");
        let err = client.query_database("db", None, None).await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed { .. }));
    }
}
