//! HTTP client for the console's `/broadcasts/` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use navshell_core::{Announcement, AnnouncementId};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Serialize;

use crate::client::FeedClient;
use crate::error::FeedError;

const BROADCASTS_PATH: &str = "/broadcasts/";

/// Body of the acknowledgment request. The API expects the flag as a string.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AckBody {
    has_seen: &'static str,
}

pub struct HttpFeedClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpFeedClient {
    /// Creates a client rooted at `base_url` (e.g. `https://console.example.com/api/0`).
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let base_url = base_url.into();
        let valid = Url::parse(&base_url)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .unwrap_or(false);
        if !valid {
            return Err(FeedError::InvalidBaseUrl(base_url));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{BROADCASTS_PATH}", self.base_url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

/// Maps a non-2xx response to `FeedError::Status`.
async fn check_status(response: Response) -> Result<Response, FeedError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(FeedError::Status { status, body })
}

/// Decodes the list payload. An absent body or `null` is an empty feed.
pub fn decode_announcements(body: &str) -> Result<Vec<Announcement>, FeedError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let items: Option<Vec<Announcement>> = serde_json::from_str(body)?;
    Ok(items.unwrap_or_default())
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn fetch_announcements(&self) -> Result<Vec<Announcement>, FeedError> {
        let req = self.authorize(self.client.get(self.endpoint()));
        let response = check_status(req.send().await?).await?;
        let body = response.text().await?;
        let items = decode_announcements(&body)?;
        tracing::debug!(count = items.len(), "fetched announcements");
        Ok(items)
    }

    async fn acknowledge(&self, ids: &[AnnouncementId]) -> Result<(), FeedError> {
        if ids.is_empty() {
            return Ok(());
        }
        let query: Vec<(&str, &str)> = ids.iter().map(|id| ("id", id.as_str())).collect();
        let req = self
            .client
            .put(self.endpoint())
            .query(&query)
            .json(&AckBody { has_seen: "1" });
        check_status(self.authorize(req).send().await?).await?;
        tracing::debug!(count = ids.len(), "acknowledged announcements");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: Option<&str>) -> HttpFeedClient {
        HttpFeedClient::new(server.uri(), token.map(str::to_string), Duration::from_secs(5))
            .expect("valid base url")
    }

    #[test]
    fn rejects_base_url_without_scheme() {
        let err = HttpFeedClient::new("console.example.com", None, Duration::from_secs(1))
            .err()
            .expect("must fail");
        assert!(matches!(err, FeedError::InvalidBaseUrl(_)));
    }

    #[test]
    fn rejects_base_url_without_host() {
        for bad in ["http://", "https:///api/0", "ftp://console.example.com"] {
            let err = HttpFeedClient::new(bad, None, Duration::from_secs(1))
                .err()
                .expect("must fail");
            assert!(matches!(err, FeedError::InvalidBaseUrl(_)), "{bad}");
        }
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let c = HttpFeedClient::new("https://console.example.com/api/0/", None, Duration::from_secs(1))
            .expect("valid");
        assert_eq!(c.endpoint(), "https://console.example.com/api/0/broadcasts/");
    }

    #[test]
    fn decode_empty_and_null_bodies() {
        assert!(decode_announcements("").expect("empty").is_empty());
        assert!(decode_announcements("  \n").expect("blank").is_empty());
        assert!(decode_announcements("null").expect("null").is_empty());
        assert!(decode_announcements("[]").expect("array").is_empty());
        assert!(matches!(decode_announcements("{\"detail\":1}"), Err(FeedError::Decode(_))));
    }

    #[tokio::test]
    async fn fetch_decodes_list_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broadcasts/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "2", "title": "b", "message": "m", "link": null, "hasSeen": true},
                {"id": "1", "title": "a", "message": "m", "link": "https://x", "hasSeen": false}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let items = client_for(&server, None).fetch_announcements().await.expect("ok");
        let ids: Vec<&str> = items.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert!(items[0].has_seen);
    }

    #[tokio::test]
    async fn fetch_empty_body_is_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broadcasts/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let items = client_for(&server, None).fetch_announcements().await.expect("ok");
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn fetch_non_success_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broadcasts/"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server, None).fetch_announcements().await.err().expect("fails");
        match err {
            FeedError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn fetch_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broadcasts/"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server, Some("secret")).fetch_announcements().await.expect("ok");
    }

    #[tokio::test]
    async fn acknowledge_sends_repeated_ids_and_flag() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/broadcasts/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hasSeen": true})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server, None)
            .acknowledge(&[AnnouncementId::from("3"), AnnouncementId::from("7")])
            .await
            .expect("ok");

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.query(), Some("id=3&id=7"));
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");
        assert_eq!(body, json!({"hasSeen": "1"}));
    }

    #[tokio::test]
    async fn acknowledge_empty_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        client_for(&server, None).acknowledge(&[]).await.expect("ok");
    }

    #[tokio::test]
    async fn acknowledge_non_success_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/broadcasts/"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let result = client_for(&server, None)
            .acknowledge(&[AnnouncementId::from("1")])
            .await;
        assert!(matches!(result, Err(FeedError::Status { status: 403, .. })));
    }
}
