//! Generation invoker: one prompt in, trimmed text out.

use doppel_config::SamplingConfig;
use doppel_core::error::ProviderError;
use doppel_core::message::Message;
use doppel_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::debug;

/// A failed generation call.
#[derive(Debug, Clone, thiserror::Error)]
#[error("generation failed: {source}")]
pub struct GenerationFailure {
    pub source: ProviderError,
    pub is_credential_error: bool,
}

impl From<ProviderError> for GenerationFailure {
    fn from(source: ProviderError) -> Self {
        let is_credential_error = source.is_credential_error();
        Self {
            source,
            is_credential_error,
        }
    }
}

/// Calls the configured provider with a given sampling configuration.
pub struct GenerationInvoker {
    provider: Arc<dyn Provider>,
    model: String,
}

impl GenerationInvoker {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send `prompt` as a single user message and return the trimmed text.
    pub async fn invoke(
        &self,
        prompt: &str,
        sampling: &SamplingConfig,
    ) -> Result<String, GenerationFailure> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: sampling.temperature,
            top_p: Some(sampling.top_p),
            top_k: Some(sampling.top_k),
            max_tokens: Some(sampling.max_output_tokens),
            stop: Vec::new(),
        };

        debug!(
            provider = %self.provider.name(),
            model = %self.model,
            temperature = sampling.temperature,
            max_tokens = sampling.max_output_tokens,
            prompt_len = prompt.len(),
            "Invoking generation"
        );

        let response = self.provider.complete(request).await?;
        let text = response.message.content.trim();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse("blank completion".into()).into());
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedProvider;

    #[tokio::test]
    async fn trims_output_and_forwards_sampling() {
        let provider = Arc::new(ScriptedProvider::texts(&["  Hello there.\n\n"]));
        let invoker = GenerationInvoker::new(provider.clone(), "test-model");

        let text = invoker
            .invoke("prompt", &SamplingConfig::explanation())
            .await
            .unwrap();
        assert_eq!(text, "Hello there.");

        let seen = provider.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "test-model");
        assert_eq!(seen[0].top_k, Some(20));
        assert_eq!(seen[0].max_tokens, Some(256));
        assert!((seen[0].temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(seen[0].messages[0].content, "prompt");
    }

    #[tokio::test]
    async fn blank_output_is_a_non_credential_failure() {
        let provider = Arc::new(ScriptedProvider::texts(&["   "]));
        let invoker = GenerationInvoker::new(provider, "m");
        let err = invoker
            .invoke("p", &SamplingConfig::reply())
            .await
            .unwrap_err();
        assert!(!err.is_credential_error);
        assert!(matches!(err.source, ProviderError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn credential_flag_is_set() {
        let provider = Arc::new(ScriptedProvider::failing(
            ProviderError::AuthenticationFailed("API key not valid".into()),
        ));
        let invoker = GenerationInvoker::new(provider, "m");
        let err = invoker
            .invoke("p", &SamplingConfig::reply())
            .await
            .unwrap_err();
        assert!(err.is_credential_error);
    }

    #[tokio::test]
    async fn network_failure_is_not_credential() {
        let provider = Arc::new(ScriptedProvider::failing(ProviderError::Network(
            "connection refused".into(),
        )));
        let invoker = GenerationInvoker::new(provider, "m");
        let err = invoker
            .invoke("p", &SamplingConfig::reply())
            .await
            .unwrap_err();
        assert!(!err.is_credential_error);
    }
}
