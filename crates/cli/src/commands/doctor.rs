//! `clinicchat doctor`: Diagnose configuration and provider reachability.

use std::path::Path;

use clinicchat_config::AppConfig;
use clinicchat_core::provider::Provider;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 ClinicChat Doctor — Diagnostics");
    println!("==================================\n");

    let mut issues = 0;
    let file = super::config_file(config_path);

    if !file.exists() {
        println!("  ⚠️  No config file at {}, using defaults", file.display());
        issues += 1;
    }

    let config = match AppConfig::load_with_env(&file) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 blocking issue found.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured for '{}'", config.provider);
    } else {
        println!("  ⚠️  No API key for '{}'; set CLINICCHAT_API_KEY", config.provider);
        issues += 1;
    }

    if config.auth.require_auth && config.auth.tokens.is_empty() {
        println!("  ⚠️  Auth is required but no tokens are configured; all chat requests will get 401");
        issues += 1;
    }

    match clinicchat_providers::build_from_config(&config) {
        Ok(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
            Ok(false) => {
                println!("  ⚠️  Provider '{}' responded but reported unhealthy", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Provider could not be built: {e}");
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
