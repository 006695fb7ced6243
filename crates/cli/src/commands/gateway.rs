//! `doppel gateway`: start the HTTP API server.

use doppel_config::AppConfig;
use doppel_providers::router::requires_api_key;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Doppel Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider: {} ({})", config.default_provider, config.active_model());
    let key_status = if config.has_api_key() {
        "configured"
    } else if requires_api_key(&config.default_provider) {
        "missing"
    } else {
        "not needed"
    };
    println!("   API key: {key_status}");

    doppel_gateway::start(config).await?;

    Ok(())
}
