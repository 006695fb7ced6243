//! Error types for the Doppel domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for Doppel setup failures.
///
/// Failures during synthesis are either recovered by the fallback path or
/// surface as [`SynthesisError`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("No API key configured for provider '{0}'")]
    MissingCredential(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider returned no usable text: {0}")]
    EmptyResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Substrings that identify a credential problem inside an otherwise
/// unstructured error message.
const CREDENTIAL_MARKERS: &[&str] = &[
    "api_key_invalid",
    "api key not valid",
    "invalid api key",
    "invalid_api_key",
    "permission_denied",
];

impl ProviderError {
    /// Whether this failure is caused by an invalid or missing credential.
    ///
    /// Structured variants are authoritative; the message scan only applies
    /// to `ApiError`, whose body is opaque provider text.
    pub fn is_credential_error(&self) -> bool {
        match self {
            ProviderError::AuthenticationFailed(_) | ProviderError::MissingCredential(_) => true,
            ProviderError::ApiError { message, .. } => {
                let lower = message.to_lowercase();
                CREDENTIAL_MARKERS.iter().any(|m| lower.contains(m))
            }
            _ => false,
        }
    }
}

/// Errors the synthesis pipeline surfaces to its caller.
///
/// Every other generation failure is recovered by the fallback synthesizer,
/// so this enum only carries the cases that must reach the operator.
#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    #[error("{message}: {details}")]
    Credential { message: String, details: String },
}
