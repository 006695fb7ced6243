//! Configuration loading, validation, and management for Doppel.
//!
//! Loads configuration from `~/.doppel/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! The generation API key is threaded explicitly from here into the provider
//! at construction; nothing reads it from process state afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.doppel/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the generation service (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default generation provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Sampling parameters for the reply and explanation calls
    #[serde(default)]
    pub sampling: SamplingSettings,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-1.5-flash".into()
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("gateway", &self.gateway)
            .field("sampling", &self.sampling)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Sampling parameters for one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl SamplingConfig {
    /// Creative settings for the persona reply.
    pub fn reply() -> Self {
        Self {
            temperature: 0.9,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 1024,
        }
    }

    /// Conservative settings for the short justification.
    pub fn explanation() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.8,
            top_k: 20,
            max_output_tokens: 256,
        }
    }

    fn validate(&self, label: &str) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "sampling.{label}.temperature must be between 0.0 and 2.0"
            )));
        }
        if self.top_p <= 0.0 || self.top_p > 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "sampling.{label}.top_p must be in (0.0, 1.0]"
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(ConfigError::ValidationError(format!(
                "sampling.{label}.max_output_tokens must be > 0"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingSettings {
    #[serde(default = "SamplingConfig::reply")]
    pub reply: SamplingConfig,

    #[serde(default = "SamplingConfig::explanation")]
    pub explanation: SamplingConfig,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            reply: SamplingConfig::reply(),
            explanation: SamplingConfig::explanation(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.doppel/config.toml).
    ///
    /// Also checks environment variables, see [`AppConfig::apply_env`].
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.api_key = non_empty(config.api_key.take());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// - `DOPPEL_API_KEY`, `GEMINI_API_KEY`, `OPENAI_API_KEY` (in that
    ///   order) fill `api_key` when the file left it unset
    /// - `DOPPEL_PROVIDER`, `DOPPEL_MODEL`, `DOPPEL_PORT` always win
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.api_key.is_none() {
            self.api_key = ["DOPPEL_API_KEY", "GEMINI_API_KEY", "OPENAI_API_KEY"]
                .iter()
                .find_map(|key| non_empty(lookup(key)));
        }

        if let Some(provider) = non_empty(lookup("DOPPEL_PROVIDER")) {
            self.default_provider = provider;
        }

        if let Some(model) = non_empty(lookup("DOPPEL_MODEL")) {
            self.default_model = model;
        }

        if let Some(port) = non_empty(lookup("DOPPEL_PORT")) {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("DOPPEL_PORT is not a valid port: {port}"))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".doppel")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "default_model must not be empty".into(),
            ));
        }
        self.sampling.reply.validate("reply")?;
        self.sampling.explanation.validate("explanation")?;
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// The model to request: the default provider's own `default_model` if
    /// set, otherwise the top-level `default_model`.
    pub fn active_model(&self) -> &str {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.default_model.as_deref())
            .unwrap_or(&self.default_model)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            gateway: GatewayConfig::default(),
            sampling: SamplingSettings::default(),
            providers: HashMap::new(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.gateway.port, 8787);
        assert!(config.validate().is_ok());
        assert!(!config.has_api_key());
    }

    #[test]
    fn reply_sampling_is_hotter_and_longer_than_explanation() {
        let s = SamplingSettings::default();
        assert!(s.reply.temperature > s.explanation.temperature);
        assert!(s.reply.max_output_tokens > s.explanation.max_output_tokens);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.sampling.reply, config.sampling.reply);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.sampling.reply.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_output_cap_rejected() {
        let mut config = AppConfig::default();
        config.sampling.explanation.max_output_tokens = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().default_model, "gemini-1.5-flash");
    }

    #[test]
    fn load_from_file_with_partial_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
api_key = "  "
default_model = "gemini-1.5-pro"

[gateway]
port = 9000

[sampling.explanation]
temperature = 0.2
top_p = 0.7
top_k = 10
max_output_tokens = 128
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.default_model, "gemini-1.5-pro");
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.sampling.explanation.max_output_tokens, 128);
        assert_eq!(config.sampling.reply, SamplingConfig::reply());
    }

    #[test]
    fn unparseable_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "gateway = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_fills_missing_api_key_in_priority_order() {
        let mut config = AppConfig::default();
        config
            .apply_env(env_of(&[("GEMINI_API_KEY", "g-key"), ("OPENAI_API_KEY", "o-key")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("g-key"));
        assert!(config.has_api_key());
    }

    #[test]
    fn env_does_not_replace_file_api_key() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config
            .apply_env(env_of(&[("DOPPEL_API_KEY", "from-env")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn empty_env_key_counts_as_absent() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&[("DOPPEL_API_KEY", "")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn env_overrides_provider_model_and_port() {
        let mut config = AppConfig::default();
        config
            .apply_env(env_of(&[
                ("DOPPEL_PROVIDER", "openai"),
                ("DOPPEL_MODEL", "gpt-4o-mini"),
                ("DOPPEL_PORT", "3001"),
            ]))
            .unwrap();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.gateway.port, 3001);
    }

    #[test]
    fn bad_port_env_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env(env_of(&[("DOPPEL_PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn provider_model_overrides_default_model() {
        let mut config = AppConfig::default();
        assert_eq!(config.active_model(), "gemini-1.5-flash");
        config.providers.insert(
            "gemini".into(),
            ProviderConfig {
                api_key: None,
                api_url: None,
                default_model: Some("gemini-1.5-pro".into()),
            },
        );
        assert_eq!(config.active_model(), "gemini-1.5-pro");
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = AppConfig {
            api_key: Some("super-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini"));
        assert!(toml_str.contains("8787"));
        assert!(toml_str.contains("max_output_tokens"));
    }
}
