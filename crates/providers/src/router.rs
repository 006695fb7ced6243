//! Provider router: selects the correct generation backend based on config.

use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;
use doppel_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes generation requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }
}

/// Local servers that accept requests without an API key.
const LOCAL_BACKENDS: &[&str] = &["ollama", "vllm"];

/// Whether calls to the named provider need an API key.
pub fn requires_api_key(provider_name: &str) -> bool {
    !LOCAL_BACKENDS.contains(&provider_name)
}

/// Build providers from configuration.
///
/// The default provider is always registered, even without an API key; a
/// hosted backend then reports a missing credential on every call.
pub fn build_from_config(config: &doppel_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone());
        router.register(
            name.clone(),
            build_provider(name, provider_config.api_url.as_deref(), api_key),
        );
    }

    if router.get(&config.default_provider).is_none() {
        router.register(
            config.default_provider.clone(),
            build_provider(&config.default_provider, None, config.api_key.clone()),
        );
    }

    router
}

fn build_provider(name: &str, api_url: Option<&str>, api_key: Option<String>) -> Arc<dyn Provider> {
    if name == "gemini" {
        let mut p = GeminiProvider::new(api_key);
        if let Some(url) = api_url {
            p = p.with_base_url(url);
        }
        Arc::new(p)
    } else {
        let base_url = api_url
            .map(String::from)
            .unwrap_or_else(|| default_base_url(name));
        match api_key {
            None if !requires_api_key(name) => Arc::new(OpenAiCompatProvider::local(name, base_url)),
            api_key => Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)),
        }
    }
}

/// Get the default base URL for well-known OpenAI-compatible providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
