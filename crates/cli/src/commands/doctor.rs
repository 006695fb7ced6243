//! `doppel doctor`: diagnose configuration and provider health.

use doppel_config::AppConfig;
use doppel_providers::router::requires_api_key;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Doppel Doctor: System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file, using defaults (run `doppel onboard`)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Cannot continue without a valid config.");
            return Ok(());
        }
    };

    println!(
        "  ✅ Provider: {} (model {})",
        config.default_provider,
        config.active_model()
    );

    let can_call = config.has_api_key() || !requires_api_key(&config.default_provider);
    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else if can_call {
        println!("  ✅ No API key needed for {}", config.default_provider);
    } else {
        println!("  ⚠️  No API key configured: set DOPPEL_API_KEY or GEMINI_API_KEY");
        issues += 1;
    }

    let router = doppel_providers::router::build_from_config(&config);
    match router.default() {
        Some(provider) if can_call => match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider reachable"),
            Ok(false) => {
                println!("  ⚠️  Provider reported unhealthy");
                issues += 1;
            }
            Err(e) if e.is_credential_error() => {
                println!("  ❌ Provider rejected the API key: {e}");
                issues += 1;
            }
            Err(e) => {
                println!("  ⚠️  Provider unreachable, replies will use the offline fallback: {e}");
                issues += 1;
            }
        },
        Some(_) => println!("  ⏭️  Skipping provider health check without an API key"),
        None => {
            println!("  ❌ No provider registered as '{}'", config.default_provider);
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
