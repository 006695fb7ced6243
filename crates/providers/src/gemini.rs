//! Google Gemini native provider implementation.
//!
//! Uses the `generateContent` endpoint of the Generative Language API.
//!
//! Features:
//! - `x-goog-api-key` header authentication
//! - System prompt as top-level `systemInstruction`
//! - `generationConfig` carrying temperature, topP, topK, maxOutputTokens
//! - Structured credential detection from the `ErrorInfo.reason` field

use async_trait::async_trait;
use doppel_core::error::ProviderError;
use doppel_core::message::{Message, Role};
use doppel_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` provider.
pub struct GeminiProvider {
    name: String,
    base_url: String,
    /// `None` means no key was configured; calls fail without touching the network.
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider. Empty keys are treated as absent.
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            name: "gemini".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ProviderError::MissingCredential(self.name.clone()))
    }

    /// Split system messages into `systemInstruction`; everything else
    /// becomes `contents`, with assistant turns mapped to the `model` role.
    fn to_api_body(request: &ProviderRequest) -> GenerateContentRequest {
        let mut system_parts: Vec<ApiPart> = Vec::new();
        let mut contents: Vec<ApiContent> = Vec::new();

        for msg in &request.messages {
            match msg.role {
                Role::System => system_parts.push(ApiPart {
                    text: Some(msg.content.clone()),
                }),
                Role::User | Role::Assistant => {
                    let role = if msg.role == Role::User { "user" } else { "model" };
                    contents.push(ApiContent {
                        role: Some(role.into()),
                        parts: vec![ApiPart {
                            text: Some(msg.content.clone()),
                        }],
                    });
                }
            }
        }

        GenerateContentRequest {
            contents,
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(ApiContent {
                    role: None,
                    parts: system_parts,
                })
            },
            generation_config: GenerationConfig {
                temperature: request.temperature,
                top_p: request.top_p,
                top_k: request.top_k,
                max_output_tokens: request.max_tokens,
                stop_sequences: request.stop.clone(),
            },
        }
    }

    /// Map a non-200 status and body onto a `ProviderError`.
    fn map_error(status: u16, body: &str) -> ProviderError {
        let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
        let message = parsed
            .as_ref()
            .map(|e| e.error.message.clone())
            .unwrap_or_else(|| body.to_string());
        let key_invalid = parsed.as_ref().is_some_and(|e| {
            e.error
                .details
                .iter()
                .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
        });

        match status {
            401 | 403 => ProviderError::AuthenticationFailed(message),
            400 if key_invalid => ProviderError::AuthenticationFailed(message),
            404 => ProviderError::ModelNotFound(message),
            429 => ProviderError::RateLimited {
                retry_after_secs: 5,
            },
            _ => ProviderError::ApiError {
                status_code: status,
                message: body.to_string(),
            },
        }
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(response: &GenerateContentResponse) -> Result<String, ProviderError> {
        let candidate = response.candidates.first().ok_or_else(|| {
            let reason = response
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.clone())
                .unwrap_or_else(|| "no candidates".into());
            ProviderError::EmptyResponse(reason)
        })?;

        let text: String = candidate
            .content
            .as_ref()
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse(
                candidate
                    .finish_reason
                    .clone()
                    .unwrap_or_else(|| "empty candidate".into()),
            ));
        }

        Ok(text)
    }
}

#[async_trait]
impl doppel_core::Provider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let api_key = self.key()?;
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let body = Self::to_api_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini returned error");
            return Err(Self::map_error(status, &error_body));
        }

        let api_response: GenerateContentResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let text = Self::extract_text(&api_response)?;

        let usage = api_response.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage,
            model: api_response.model_version.unwrap_or(request.model),
            metadata: serde_json::Map::new(),
        })
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let api_key = self.key()?;
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(Self::map_error(status, &error_body));
        }

        let body: ModelListResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(body
            .models
            .into_iter()
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.list_models().await.map(|_| true)
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelListResponse {
    #[serde(default)]
    models: Vec<ApiModel>,
}

#[derive(Debug, Deserialize)]
struct ApiModel {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppel_core::Provider;

    fn request(messages: Vec<Message>) -> ProviderRequest {
        ProviderRequest {
            model: "gemini-1.5-flash".into(),
            messages,
            temperature: 0.9,
            top_p: Some(0.95),
            top_k: Some(40),
            max_tokens: Some(1024),
            stop: vec![],
        }
    }

    #[test]
    fn constructor_and_base_url() {
        let provider = GeminiProvider::new(Some("key".into())).with_base_url("http://localhost:9/v1/");
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.base_url, "http://localhost:9/v1");
    }

    #[test]
    fn blank_key_is_absent() {
        let provider = GeminiProvider::new(Some("   ".into()));
        assert!(matches!(provider.key(), Err(ProviderError::MissingCredential(_))));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let provider = GeminiProvider::new(None).with_base_url("http://127.0.0.1:1");
        let err = provider
            .complete(request(vec![Message::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential(_)));
        assert!(err.is_credential_error());
    }

    #[test]
    fn body_uses_camel_case_generation_config() {
        let req = request(vec![Message::system("Be Ada"), Message::user("Hello")]);
        let body = serde_json::to_value(GeminiProvider::to_api_body(&req)).unwrap();

        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be Ada");
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert!(body["generationConfig"].get("stopSequences").is_none());
    }

    #[test]
    fn assistant_turns_map_to_model_role() {
        let req = request(vec![Message::user("a"), Message::assistant("b")]);
        let body = serde_json::to_value(GeminiProvider::to_api_body(&req)).unwrap();
        assert_eq!(body["contents"][1]["role"], "model");
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn parse_candidate_text() {
        let data = r#"{
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Hello "}, {"text": "there."}]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3, "totalTokenCount": 15},
            "modelVersion": "gemini-1.5-flash-002"
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(data).unwrap();
        assert_eq!(GeminiProvider::extract_text(&parsed).unwrap(), "Hello there.");
        assert_eq!(parsed.usage_metadata.unwrap().total_token_count, 15);
    }

    #[test]
    fn blocked_prompt_is_empty_response() {
        let data = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(data).unwrap();
        match GeminiProvider::extract_text(&parsed) {
            Err(ProviderError::EmptyResponse(reason)) => assert_eq!(reason, "SAFETY"),
            other => panic!("Expected EmptyResponse, got: {other:?}"),
        }
    }

    #[test]
    fn candidate_without_text_is_empty_response() {
        let data = r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(data).unwrap();
        assert!(matches!(
            GeminiProvider::extract_text(&parsed),
            Err(ProviderError::EmptyResponse(_))
        ));
    }

    #[test]
    fn invalid_key_body_maps_to_authentication_failed() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT",
            "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "API_KEY_INVALID"}]}}"#;
        let err = GeminiProvider::map_error(400, body);
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            GeminiProvider::map_error(429, "{}"),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            GeminiProvider::map_error(404, r#"{"error": {"message": "models/nope is not found"}}"#),
            ProviderError::ModelNotFound(_)
        ));
        assert!(matches!(
            GeminiProvider::map_error(403, "forbidden"),
            ProviderError::AuthenticationFailed(_)
        ));
        let err = GeminiProvider::map_error(503, "overloaded");
        assert!(matches!(err, ProviderError::ApiError { status_code: 503, .. }));
        assert!(!err.is_credential_error());
    }

    #[test]
    fn plain_bad_request_is_not_a_credential_error() {
        let body = r#"{"error": {"code": 400, "message": "Invalid JSON payload", "status": "INVALID_ARGUMENT"}}"#;
        let err = GeminiProvider::map_error(400, body);
        assert!(!err.is_credential_error());
    }
}
