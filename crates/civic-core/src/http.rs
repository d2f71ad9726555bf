//! HTTP implementation of the issue gateway
//!
//! Talks to the issue service's REST API. Attaches the bearer credential to
//! every request and owns the request timeout; the coordinator has neither.

use crate::gateway::{Ack, IssueEnvelope, IssueGateway, IssuePage};
use crate::issue::{IssueDraft, IssuePatch, IssueRecord, ListParams};
use crate::{Config, Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Category reference entry (`GET /categories`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub name_si: String,
    #[serde(default)]
    pub name_ta: String,
}

#[derive(Debug, Deserialize)]
struct Categories {
    categories: Vec<CategoryInfo>,
}

#[derive(Debug, Deserialize)]
struct Districts {
    districts: Vec<String>,
}

/// Error body shapes the service produces: `{error}` or `{error, message}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.api_url.clone(),
            config.token.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, "issue service request");
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let response = check(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Like `send`, but success rests on the status alone; an empty or
    /// non-JSON body still acknowledges
    async fn acknowledge(&self, builder: RequestBuilder) -> Result<Ack> {
        let response = builder.send().await?;
        let response = check(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes).unwrap_or_default())
    }

    /// Read-only reference data; never feeds the issue store
    pub async fn categories(&self) -> Result<Vec<CategoryInfo>> {
        let body: Categories = self.send(self.request(Method::GET, "categories")).await?;
        Ok(body.categories)
    }

    pub async fn districts(&self) -> Result<Vec<String>> {
        let body: Districts = self.send(self.request(Method::GET, "districts")).await?;
        Ok(body.districts)
    }
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_from(status, &body))
}

/// Map a failed response to an error, keeping the service's message if any
fn error_from(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .filter(|m| !m.trim().is_empty());

    if status == StatusCode::UNAUTHORIZED {
        Error::Unauthorized { message }
    } else {
        Error::Service {
            status: Some(status.as_u16()),
            message,
        }
    }
}

#[async_trait]
impl IssueGateway for HttpGateway {
    async fn list(&self, params: &ListParams) -> Result<IssuePage> {
        self.send(self.request(Method::GET, "issues").query(params)).await
    }

    async fn get(&self, id: &str) -> Result<IssueRecord> {
        let envelope: IssueEnvelope = self
            .send(self.request(Method::GET, &format!("issues/{id}")))
            .await?;
        Ok(envelope.issue)
    }

    async fn create(&self, draft: &IssueDraft) -> Result<IssueRecord> {
        let envelope: IssueEnvelope = self
            .send(self.request(Method::POST, "issues").json(draft))
            .await?;
        Ok(envelope.issue)
    }

    async fn update(&self, id: &str, patch: &IssuePatch) -> Result<IssueRecord> {
        let envelope: IssueEnvelope = self
            .send(self.request(Method::PUT, &format!("issues/{id}")).json(patch))
            .await?;
        Ok(envelope.issue)
    }

    async fn remove(&self, id: &str) -> Result<Ack> {
        self.acknowledge(self.request(Method::DELETE, &format!("issues/{id}"))).await
    }

    async fn verify(&self, id: &str) -> Result<IssueRecord> {
        let envelope: IssueEnvelope = self
            .send(self.request(Method::POST, &format!("issues/{id}/verify")))
            .await?;
        Ok(envelope.issue)
    }

    async fn list_mine(&self, params: &ListParams) -> Result<IssuePage> {
        self.send(self.request(Method::GET, "issues/my-issues").query(params)).await
    }

    async fn close(&self, id: &str) -> Result<IssueRecord> {
        let envelope: IssueEnvelope = self
            .send(
                self.request(Method::POST, &format!("issues/{id}/close"))
                    .json(&serde_json::json!({})),
            )
            .await?;
        Ok(envelope.issue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IssueCoordinator, Outcome};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const FEED: &str = r#"{"issues": [
        {"id": "i1", "user_id": "u1", "title": "Broken main", "category": "water",
         "created_at": "2024-05-01T10:00:00"},
        {"id": "i9", "user_id": "u1", "title": "Blocked drain", "category": "drainage",
         "created_at": "2024-05-02T10:00:00"}
    ], "pagination": {"page": 1, "limit": 20, "total": 2, "pages": 1}}"#;

    fn json_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Answer one connection per canned response, in order
    async fn serve(responses: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}/api")
    }

    async fn delete_after_feed(delete_response: String) -> IssueCoordinator<HttpGateway> {
        let base_url = serve(vec![json_response("200 OK", FEED), delete_response]).await;
        let gateway = HttpGateway::new(base_url, None, Duration::from_secs(5)).unwrap();
        let coordinator = IssueCoordinator::new(Arc::new(gateway));
        assert_eq!(coordinator.fetch_issues(&ListParams::page(1)).await, Outcome::Applied);
        assert_eq!(coordinator.delete_issue("i9").await, Outcome::Applied);
        coordinator
    }

    #[tokio::test]
    async fn test_delete_with_no_content_removes_entry() {
        let response = "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_string();
        let coordinator = delete_after_feed(response).await;
        coordinator.read(|store| {
            assert_eq!(store.error(), None);
            assert!(!store.is_loading());
            let ids: Vec<&str> = store.issues().iter().map(|i| i.id.as_str()).collect();
            assert_eq!(ids, vec!["i1"]);
        });
    }

    #[tokio::test]
    async fn test_delete_ignores_unexpected_body() {
        let coordinator = delete_after_feed(json_response("200 OK", "deleted")).await;
        assert_eq!(coordinator.read(|store| store.issues().len()), 1);

        let coordinator = delete_after_feed(json_response("200 OK", r#"{"success": true}"#)).await;
        assert_eq!(coordinator.read(|store| store.issues().len()), 1);
    }

    #[tokio::test]
    async fn test_delete_rejected_by_status_keeps_entry() {
        let base_url = serve(vec![
            json_response("200 OK", FEED),
            json_response("403 Forbidden", r#"{"error": "Unauthorized"}"#),
        ])
        .await;
        let gateway = HttpGateway::new(base_url, None, Duration::from_secs(5)).unwrap();
        let coordinator = IssueCoordinator::new(Arc::new(gateway));
        coordinator.fetch_issues(&ListParams::page(1)).await;

        assert_eq!(coordinator.delete_issue("i9").await, Outcome::Failed);
        coordinator.read(|store| {
            assert_eq!(store.error(), Some("Unauthorized"));
            assert_eq!(store.issues().len(), 2);
        });
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let gateway =
            HttpGateway::new("http://localhost:5000/api/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:5000/api");
        assert_eq!(
            gateway.url("issues/i1/verify"),
            "http://localhost:5000/api/issues/i1/verify"
        );
        assert_eq!(gateway.url("/issues"), "http://localhost:5000/api/issues");
    }

    #[test]
    fn test_error_body_message_kept() {
        let err = error_from(StatusCode::FORBIDDEN, r#"{"error": "Unauthorized"}"#);
        assert_eq!(err.service_message(), Some("Unauthorized"));
        assert!(matches!(err, Error::Service { status: Some(403), .. }));
    }

    #[test]
    fn test_error_body_without_message() {
        let err = error_from(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.service_message(), None);

        let empty = error_from(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error": ""}"#);
        assert_eq!(empty.service_message(), None);
    }

    #[test]
    fn test_unauthorized_mapped() {
        let err = error_from(
            StatusCode::UNAUTHORIZED,
            r#"{"error": "Unauthorized", "message": "Authentication required"}"#,
        );
        assert!(matches!(err, Error::Unauthorized { .. }));
        assert_eq!(err.service_message(), Some("Unauthorized"));
    }

    #[test]
    fn test_list_page_decodes() {
        let body = r#"{
            "issues": [{"id": "i1", "user_id": "u1", "title": "Flooded underpass",
                        "category": "flood", "status": "pending", "priority": "high",
                        "created_at": "2024-05-01T10:00:00"}],
            "pagination": {"page": 1, "limit": 20, "total": 1, "pages": 1}
        }"#;
        let page: IssuePage = serde_json::from_str(body).unwrap();
        assert_eq!(page.issues.len(), 1);
        assert_eq!(page.issues[0].category, crate::Category::Flood);
        assert_eq!(page.pagination.total, 1);
    }
}
