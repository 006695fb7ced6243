//! `doppel reply`: one-shot synthesis from a profile file.

use doppel_config::AppConfig;
use doppel_core::{CloneProfile, SynthesisError, SynthesisRequest};
use doppel_persona::CloneSynthesizer;
use std::path::Path;
use tracing::info;

pub async fn run(profile_path: &Path, query: String) -> Result<(), Box<dyn std::error::Error>> {
    if query.trim().is_empty() {
        return Err("Missing query or cloneData".into());
    }

    let profile = load_profile(profile_path)?;
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let synthesizer = CloneSynthesizer::from_config(&config)?;

    let request = SynthesisRequest::new(query, profile);
    match synthesizer.synthesize(&request).await {
        Ok(synthesis) => {
            info!(source = ?synthesis.source, "Reply synthesized");
            println!("{}", serde_json::to_string_pretty(&synthesis.result)?);
            Ok(())
        }
        Err(err) => {
            let SynthesisError::Credential { message, details } = &err;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "error": message,
                    "details": details,
                }))?
            );
            Err(err.into())
        }
    }
}

/// Read a clone profile from a `.json` or `.toml` file.
pub fn load_profile(path: &Path) -> Result<CloneProfile, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read profile {}: {e}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let profile: CloneProfile = match extension.as_deref() {
        Some("json") => serde_json::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => {
            return Err(format!(
                "Unsupported profile format: {} (expected .json or .toml)",
                path.display()
            )
            .into());
        }
    };

    Ok(profile)
}
