//! `clinicchat serve`: Start the HTTP chat gateway.

use std::path::Path;

use clinicchat_config::{AppConfig, ConfigError};
use tracing::info;

/// Apply command-line overrides, then re-check the result.
fn apply_overrides(config: &mut AppConfig, port: Option<u16>) -> Result<(), ConfigError> {
    if let Some(port) = port {
        config.gateway.port = port;
    }
    config.validate()
}

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;
    apply_overrides(&mut config, port_override)
        .map_err(|e| format!("Invalid options: {e}"))?;

    info!(
        config = %super::config_file(config_path).display(),
        port = config.gateway.port,
        "Starting gateway"
    );

    println!("🩺 ClinicChat Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {} ({})", config.provider, config.assistant.model);
    println!("   Auth required: {}", config.auth.require_auth);

    clinicchat_gateway::start(config).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_override_is_applied() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, Some(8081)).unwrap();
        assert_eq!(config.gateway.port, 8081);
    }

    #[test]
    fn zero_port_override_is_rejected() {
        let mut config = AppConfig::default();
        assert!(matches!(
            apply_overrides(&mut config, Some(0)),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
