//! Gemini `generateContent` client.
//!
//! One request per prompt, no retries. The service seam is the
//! [`SummaryService`] trait so the pipeline can run against a fake in tests.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use summarybook_shared::{Result, SummaryBookError};

/// User-Agent string for service requests.
const USER_AGENT: &str = concat!("SummaryBook/", env!("CARGO_PKG_VERSION"));

/// Longest error body kept in a [`SummaryBookError::Service`].
const MAX_ERROR_BODY: usize = 200;

/// Something that turns a prompt into generated text.
pub trait SummaryService {
    /// Send `prompt` to `model` and return the raw completion text.
    fn generate(&self, model: &str, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate, or empty.
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// HTTP client for the generative-language API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl GeminiClient {
    /// Build a client for `base_url` (e.g. `https://generativelanguage.googleapis.com/v1beta`).
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| {
            SummaryBookError::config(format!("invalid service base URL '{base_url}': {e}"))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SummaryBookError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// `{base}/models/{model}:generateContent`
    fn endpoint(&self, model: &str) -> Result<Url> {
        self.base_url
            .join(&format!("models/{model}:generateContent"))
            .map_err(|e| SummaryBookError::config(format!("invalid model name '{model}': {e}")))
    }
}

impl SummaryService for GeminiClient {
    #[instrument(skip_all, fields(model = %model))]
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let url = self.endpoint(model)?;
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| SummaryBookError::Network(format!("{model}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(SummaryBookError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SummaryBookError::parse(format!("invalid service response: {e}")))?;

        let text = parsed.into_text();
        debug!(chars = text.len(), "completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(&server.uri(), "test-key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = GeminiClient::new(
            "https://generativelanguage.googleapis.com/v1beta",
            "k",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("gemini-2.5-flash").unwrap().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let err = GeminiClient::new("not a url", "k", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, SummaryBookError::Config { .. }));
    }

    #[test]
    fn missing_candidates_yield_empty_text() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(parsed.into_text(), "");

        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{}]}}]}"#).unwrap();
        assert_eq!(parsed.into_text(), "");
    }

    #[tokio::test]
    async fn generate_sends_prompt_and_reads_first_part() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/test-model:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": "hello prompt"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "**Tên bài: X**"}, {"text": "ignored"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server)
            .generate("test-model", "hello prompt")
            .await
            .unwrap();
        assert_eq!(text, "**Tên bài: X**");
    }

    #[tokio::test]
    async fn generate_maps_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = client(&server).generate("m", "p").await.unwrap_err();
        match err {
            SummaryBookError::Service { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("expected Service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_rejects_malformed_json() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server).generate("m", "p").await.unwrap_err();
        assert!(matches!(err, SummaryBookError::Parse { .. }));
    }
}
