// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the document processing API.
//!
//! Provides [`DwsClient`] which handles authentication, endpoint selection,
//! JSON vs multipart encoding, per-endpoint timeouts, and the mapping of
//! non-success responses onto [`RemoteError`].

use std::time::Duration;

use dws_config::model::ApiConfig;
use dws_core::{DwsError, HostedError, RemoteError};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::dispatch::{FieldContent, MultipartField, RequestBody};

/// Remote endpoints, relative to the configured base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Build,
    Sign,
    AiRedact,
    AccountInfo,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Build => "build",
            Endpoint::Sign => "sign",
            Endpoint::AiRedact => "ai/redact",
            Endpoint::AccountInfo => "account/info",
        }
    }
}

/// Credit figures reported in response headers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedCredits {
    pub cost: f64,
    pub remaining: Option<f64>,
}

/// A successful response whose body has not been read yet.
#[derive(Debug)]
pub struct RemoteResponse {
    pub response: reqwest::Response,
    /// `None` when the service did not report a cost.
    pub credits: Option<ReportedCredits>,
}

/// HTTP client for the processing API.
#[derive(Debug, Clone)]
pub struct DwsClient {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Option<Duration>,
    ai_redact_timeout: Duration,
    cost_header: String,
    remaining_header: String,
}

impl DwsClient {
    /// Creates a client that authenticates every request with `api_key`.
    pub fn new(config: &ApiConfig, api_key: &SecretString) -> Result<Self, DwsError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|_| DwsError::Config("API key contains characters not allowed in a header".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.client_id)
                .map_err(|e| DwsError::Config(format!("invalid client id header value: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| DwsError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
            ai_redact_timeout: Duration::from_secs(config.ai_redact_timeout_secs),
            cost_header: config.credit_cost_header.clone(),
            remaining_header: config.credit_remaining_header.clone(),
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    fn timeout_for(&self, endpoint: Endpoint) -> Option<Duration> {
        match endpoint {
            Endpoint::AiRedact => Some(self.ai_redact_timeout),
            _ => self.request_timeout,
        }
    }

    /// Sends `body` to `endpoint` and returns the unread success response.
    pub async fn post(&self, endpoint: Endpoint, body: RequestBody) -> Result<RemoteResponse, DwsError> {
        let mut request = self.client.post(self.url(endpoint));
        if let Some(timeout) = self.timeout_for(endpoint) {
            request = request.timeout(timeout);
        }
        let request = match body {
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Multipart(fields) => request.multipart(build_form(fields)),
        };

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.without_url().to_string()))?;
        let response = check_status(response).await?;
        let credits = self.reported_credits(response.headers());
        debug!(endpoint = endpoint.path(), status = %response.status(), ?credits, "processing response received");
        Ok(RemoteResponse { response, credits })
    }

    /// Fetches account information (including the credit balance) and
    /// returns the body verbatim.
    pub async fn account_info(&self) -> Result<String, DwsError> {
        let mut request = self.client.get(self.url(Endpoint::AccountInfo));
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.without_url().to_string()))?;
        let response = check_status(response).await?;
        response
            .text()
            .await
            .map_err(|e| RemoteError::BodyRead(e.to_string()).into())
    }

    fn reported_credits(&self, headers: &HeaderMap) -> Option<ReportedCredits> {
        let number = |name: &str| {
            headers
                .get(name)?
                .to_str()
                .ok()?
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
        };
        Some(ReportedCredits {
            cost: number(&self.cost_header)?,
            remaining: number(&self.remaining_header),
        })
    }
}

/// Maps a non-success response onto a [`RemoteError`].
///
/// Bodies shaped like a hosted error are kept as structured JSON; anything
/// else is reported with the status and raw text.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DwsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .map_err(|e| RemoteError::BodyRead(e.to_string()))?;
    debug!(status = %status, "processing request failed");
    let error = match HostedError::from_body(&body) {
        Some(hosted) => RemoteError::Hosted(hosted),
        None => RemoteError::Opaque {
            status: status.as_u16(),
            body,
        },
    };
    Err(error.into())
}

fn build_form(fields: Vec<MultipartField>) -> Form {
    let mut form = Form::new();
    for field in fields {
        form = match field.content {
            FieldContent::Text(text) => form.text(field.name, text),
            FieldContent::File { file_name, bytes } => {
                form.part(field.name, Part::bytes(bytes).file_name(file_name))
            }
        };
    }
    form
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> DwsClient {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            client_id: "dws-mcp/test".into(),
            ..ApiConfig::default()
        };
        DwsClient::new(&config, &SecretString::from("test-api-key")).unwrap()
    }

    #[test]
    fn endpoints_join_onto_base_url() {
        let client = test_client("https://api.example.com/");
        assert_eq!(client.url(Endpoint::Build), "https://api.example.com/build");
        assert_eq!(client.url(Endpoint::AiRedact), "https://api.example.com/ai/redact");
    }

    #[tokio::test]
    async fn json_request_sends_auth_and_client_headers() {
        let server = MockServer::start().await;
        let instructions = json!({"parts": [{"file": "https://example.com/a.pdf"}]});

        Mock::given(method("POST"))
            .and(path("/build"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(header("user-agent", "dws-mcp/test"))
            .and(header("content-type", "application/json"))
            .and(body_json(&instructions))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-credits-cost", "1.5")
                    .insert_header("x-credits-remaining", "98.5")
                    .set_body_bytes(b"%PDF-1.7".to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let response = client.post(Endpoint::Build, RequestBody::Json(instructions)).await.unwrap();
        assert_eq!(
            response.credits,
            Some(ReportedCredits {
                cost: 1.5,
                remaining: Some(98.5)
            })
        );
        assert_eq!(response.response.bytes().await.unwrap().as_ref(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn multipart_request_uses_form_encoding() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/build"))
            .and(header_exists("content-type"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let body = RequestBody::Multipart(vec![
            MultipartField {
                name: "instructions".into(),
                content: FieldContent::Text("{}".into()),
            },
            MultipartField {
                name: "a_pdf".into(),
                content: FieldContent::File {
                    file_name: "a.pdf".into(),
                    bytes: b"%PDF".to_vec(),
                },
            },
        ]);
        let response = client.post(Endpoint::Build, body).await.unwrap();
        assert!(response.credits.is_none());

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0].headers.get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
        let sent = String::from_utf8_lossy(&requests[0].body);
        assert!(sent.contains("name=\"instructions\""));
        assert!(sent.contains("name=\"a_pdf\"; filename=\"a.pdf\""));
    }

    #[tokio::test]
    async fn hosted_error_is_structured() {
        let server = MockServer::start().await;
        let error_body = json!({
            "details": "x",
            "status": 400,
            "requestId": "r1",
            "failingPaths": [{"path": "$.a", "details": "y"}]
        });
        Mock::given(method("POST"))
            .and(path("/build"))
            .respond_with(ResponseTemplate::new(400).set_body_json(&error_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .post(Endpoint::Build, RequestBody::Json(json!({})))
            .await
            .unwrap_err();
        let DwsError::Remote(RemoteError::Hosted(hosted)) = &err else {
            panic!("expected hosted error, got {err:?}");
        };
        assert_eq!(hosted.status(), Some(400));
        assert_eq!(hosted.failing_path_count(), 1);
    }

    #[tokio::test]
    async fn plain_error_is_opaque() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sign"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .post(Endpoint::Sign, RequestBody::Json(json!({})))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error processing request (HTTP 502): upstream down"
        );
    }

    #[tokio::test]
    async fn unparseable_credit_header_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/build"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-credits-cost", "lots")
                    .set_body_string("ok"),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let response = client.post(Endpoint::Build, RequestBody::Json(json!({}))).await.unwrap();
        assert!(response.credits.is_none());
    }

    #[tokio::test]
    async fn account_info_returns_body_verbatim() {
        let server = MockServer::start().await;
        let body = r#"{"apiKeys":{"live":"..."},"subscriptionType":"free","usage":{"totalCredits":100,"usedCredits":12}}"#;
        Mock::given(method("GET"))
            .and(path("/account/info"))
            .and(header("authorization", "Bearer test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert_eq!(client.account_info().await.unwrap(), body);
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let client = test_client("http://127.0.0.1:9");
        let err = client
            .post(Endpoint::Build, RequestBody::Json(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, DwsError::Remote(RemoteError::Transport(_))));
    }
}
