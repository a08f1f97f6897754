//! HTTP implementation of [`GenerationClient`] for the Gemini API.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use copycraft_shared::{CopyCraftError, GeminiSettings, Result};

use crate::wire::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};
use crate::{Generation, GenerationClient, GenerationRequest};

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("CopyCraft/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body echoed into an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Gemini `generateContent` client.
pub struct GeminiClient {
    http: Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl GeminiClient {
    /// Build a client from resolved settings.
    ///
    /// A missing API key is not an error here; it makes every
    /// [`generate`](GenerationClient::generate) call fail immediately instead.
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| CopyCraftError::config(format!("failed to build HTTP client: {e}")))?;

        let endpoint = model_endpoint(&settings.base_url, &settings.model)?;
        debug!(%endpoint, "gemini client ready");

        Ok(Self {
            http,
            endpoint,
            model: settings.model,
            api_key: settings.api_key,
            api_key_env: settings.api_key_env,
        })
    }

    /// Whether an API key was resolved.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// `{base}/v1beta/models/{model}:generateContent`, keeping any path prefix on `base`.
fn model_endpoint(base: &Url, model: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(&format!("v1beta/models/{model}:generateContent"))
        .map_err(|e| CopyCraftError::config(format!("invalid model endpoint for '{model}': {e}")))
}

#[async_trait]
impl GenerationClient for GeminiClient {
    #[instrument(skip_all, fields(model = %self.model, grounded = request.search_grounding))]
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        debug_assert!(!request.prompt.trim().is_empty(), "generation prompt must not be empty");

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            CopyCraftError::generation(format!(
                "no API key configured (set the {} environment variable)",
                self.api_key_env
            ))
        })?;

        let body = GenerateContentRequest::from(request);
        let start = Instant::now();

        let response = self
            .http
            .post(self.endpoint.clone())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CopyCraftError::generation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = error_detail(&text);
            warn!(%status, %detail, "generation request rejected");
            return Err(CopyCraftError::generation(format!("HTTP {status}: {detail}")));
        }

        let decoded: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| CopyCraftError::generation(format!("invalid response body: {e}")))?;

        let generation = decoded.into_generation();

        info!(
            latency_ms = start.elapsed().as_millis() as u64,
            text_len = generation.text.len(),
            chunks = generation
                .grounding_metadata
                .as_ref()
                .map_or(0, |m| m.grounding_chunks.len()),
            tokens_in = generation.usage.tokens_in,
            tokens_out = generation.usage.tokens_out,
            "generation complete"
        );

        Ok(generation)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Prefer the service's own error message; fall back to the raw body.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{} ({status})", envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/test-model:generateContent";

    fn settings(base: &str, api_key: Option<&str>) -> GeminiSettings {
        GeminiSettings {
            api_key: api_key.map(String::from),
            api_key_env: "CC_TEST_KEY".into(),
            model: "test-model".into(),
            base_url: Url::parse(base).unwrap(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn endpoint_appends_model_path() {
        let base = Url::parse("https://generativelanguage.googleapis.com").unwrap();
        let url = model_endpoint(&base, "gemini-2.5-flash").unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn endpoint_keeps_proxy_prefix() {
        let base = Url::parse("https://proxy.example.com/gemini").unwrap();
        let url = model_endpoint(&base, "m").unwrap();
        assert_eq!(
            url.as_str(),
            "https://proxy.example.com/gemini/v1beta/models/m:generateContent"
        );
    }

    #[test]
    fn error_detail_prefers_service_message() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(error_detail(body), "Quota exceeded (RESOURCE_EXHAUSTED)");
        assert_eq!(error_detail("plain failure"), "plain failure");
    }

    #[tokio::test]
    async fn grounded_generation_returns_text_and_metadata() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({"tools": [{"googleSearch": {}}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "###\nTitle: A\nDescription: B"}]},
                    "groundingMetadata": {"groundingChunks": [
                        {"web": {"uri": "https://src.example/1", "title": "One"}}
                    ]}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri(), Some("test-key"))).unwrap();
        let request = GenerationRequest::new("research this").with_search_grounding();
        let generation = client.generate(&request).await.unwrap();

        assert_eq!(generation.text, "###\nTitle: A\nDescription: B");
        let metadata = generation.grounding_metadata.expect("metadata");
        assert_eq!(metadata.grounding_chunks.len(), 1);
    }

    #[tokio::test]
    async fn system_instruction_is_sent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(body_partial_json(json!({
                "systemInstruction": {"parts": [{"text": "be a strategist"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri(), Some("k"))).unwrap();
        let request = GenerationRequest::new("p").with_system_instruction("be a strategist");
        let generation = client.generate(&request).await.unwrap();
        assert_eq!(generation.text, "ok");
        assert!(generation.grounding_metadata.is_none());
    }

    #[tokio::test]
    async fn empty_candidates_yield_empty_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri(), Some("k"))).unwrap();
        let generation = client.generate(&GenerationRequest::new("p")).await.unwrap();
        assert_eq!(generation.text, "");
    }

    #[tokio::test]
    async fn http_error_maps_to_generation_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri(), Some("k"))).unwrap();
        let err = client.generate(&GenerationRequest::new("p")).await.unwrap_err();

        assert!(matches!(err, CopyCraftError::Generation(_)));
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("Quota exceeded"));
    }

    #[tokio::test]
    async fn malformed_body_maps_to_generation_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri(), Some("k"))).unwrap();
        let err = client.generate(&GenerationRequest::new("p")).await.unwrap_err();
        assert!(matches!(err, CopyCraftError::Generation(_)));
        assert!(err.to_string().contains("invalid response body"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri(), None)).unwrap();
        assert!(!client.has_api_key());

        let err = client.generate(&GenerationRequest::new("p")).await.unwrap_err();
        assert!(matches!(err, CopyCraftError::Generation(_)));
        assert!(err.to_string().contains("CC_TEST_KEY"));
    }

    #[tokio::test]
    async fn unreachable_server_maps_to_generation_failed() {
        // Port 9 (discard) on localhost is not expected to be listening.
        let client = GeminiClient::new(settings("http://127.0.0.1:9", Some("k"))).unwrap();
        let err = client.generate(&GenerationRequest::new("p")).await.unwrap_err();
        assert!(matches!(err, CopyCraftError::Generation(_)));
        assert!(err.to_string().contains("request failed"));
    }
}
