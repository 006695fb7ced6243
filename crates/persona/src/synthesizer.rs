//! The reply synthesis pipeline.
//!
//! Classify, compose the reply prompt, generate, then compose the explanation
//! prompt (which quotes the reply) and generate again. Any failure other than
//! a credential problem hands the whole request to the fallback synthesizer;
//! credential problems surface to the caller instead.

use crate::assembler::{assemble, tags_for};
use crate::fallback::{FallbackSynthesizer, PhraseSource, ThreadRngSource};
use crate::intent::classify_intent;
use crate::invoker::{GenerationFailure, GenerationInvoker};
use crate::prompt::{explanation_prompt, reply_prompt};
use doppel_config::{AppConfig, SamplingSettings};
use doppel_core::{Error, Provider, SynthesisError, SynthesisRequest, SynthesisResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Message returned to callers when generation is refused for credentials.
pub const CREDENTIAL_ERROR_MESSAGE: &str = "Invalid or missing generation API key";

/// Which path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSource {
    Remote,
    Fallback,
}

/// A synthesized result and the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub result: SynthesisResult,
    pub source: GenerationSource,
}

/// Persona reply synthesizer.
///
/// Holds only immutable state, so one instance is shared across requests.
pub struct CloneSynthesizer {
    invoker: GenerationInvoker,
    sampling: SamplingSettings,
    fallback: FallbackSynthesizer,
}

impl CloneSynthesizer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            invoker: GenerationInvoker::new(provider, model),
            sampling: SamplingSettings::default(),
            fallback: FallbackSynthesizer::new(Arc::new(ThreadRngSource)),
        }
    }

    /// Build the synthesizer for the configured default provider and model.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let router = doppel_providers::router::build_from_config(config);
        let provider = router.default().ok_or_else(|| Error::Config {
            message: format!("no provider registered as '{}'", config.default_provider),
        })?;

        info!(
            provider = %config.default_provider,
            model = %config.active_model(),
            "Synthesizer ready"
        );

        Ok(Self::new(provider, config.active_model()).with_sampling(config.sampling.clone()))
    }

    pub fn with_sampling(mut self, sampling: SamplingSettings) -> Self {
        self.sampling = sampling;
        self
    }

    /// Replace the fallback's fragment selection.
    pub fn with_phrase_source(mut self, source: Arc<dyn PhraseSource>) -> Self {
        self.fallback = FallbackSynthesizer::new(source);
        self
    }

    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<Synthesis, SynthesisError> {
        match self.generate(request).await {
            Ok(result) => {
                debug!(tags = ?result.tags, "Remote synthesis complete");
                Ok(Synthesis {
                    result,
                    source: GenerationSource::Remote,
                })
            }
            Err(failure) if failure.is_credential_error => {
                warn!(
                    provider = %self.invoker.provider_name(),
                    error = %failure.source,
                    "Generation rejected credentials"
                );
                Err(SynthesisError::Credential {
                    message: CREDENTIAL_ERROR_MESSAGE.into(),
                    details: failure.source.to_string(),
                })
            }
            Err(failure) => {
                warn!(
                    provider = %self.invoker.provider_name(),
                    error = %failure.source,
                    "Generation failed, using fallback reply"
                );
                Ok(Synthesis {
                    result: self.fallback.synthesize(request),
                    source: GenerationSource::Fallback,
                })
            }
        }
    }

    async fn generate(&self, request: &SynthesisRequest) -> Result<SynthesisResult, GenerationFailure> {
        let profile = &request.profile;
        let intent = classify_intent(&request.query);

        let reply = self
            .invoker
            .invoke(&reply_prompt(profile, &request.query), &self.sampling.reply)
            .await?;

        let explanation = self
            .invoker
            .invoke(
                &explanation_prompt(profile, &request.query, &reply),
                &self.sampling.explanation,
            )
            .await?;

        Ok(assemble(reply, explanation, tags_for(profile, &intent)))
    }
}
