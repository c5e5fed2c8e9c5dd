//! Provider selection: builds the configured completion backend.
//!
//! Exactly one provider serves the process; it is constructed once at
//! startup and shared behind an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use clinicchat_config::AppConfig;
use clinicchat_core::error::ProviderError;
use clinicchat_core::provider::Provider;
use tracing::info;

use crate::anthropic::AnthropicProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the provider named by `config.provider`.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.provider.as_str();
    let settings = config.active_provider().cloned().unwrap_or_default();
    let api_key = config.provider_api_key().unwrap_or_default();
    let timeout = Duration::from_secs(settings.timeout_secs);

    let provider: Arc<dyn Provider> = if name == "anthropic" {
        let mut p = AnthropicProvider::new(&api_key, timeout)?;
        if let Some(ref url) = settings.api_url {
            p = p.with_base_url(url);
        }
        Arc::new(p)
    } else {
        let base_url = settings
            .api_url
            .clone()
            .or_else(|| default_base_url(name))
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "provider '{name}' has no api_url and no well-known default"
                ))
            })?;
        Arc::new(OpenAiCompatProvider::new(name, base_url, &api_key, timeout)?)
    };

    info!(
        provider = %name,
        timeout_secs = settings.timeout_secs,
        has_key = !api_key.is_empty(),
        "Completion provider ready"
    );

    Ok(provider)
}

/// Get the default base URL for well-known OpenAI-compatible providers.
fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        _ => return None,
    };
    Some(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinicchat_config::ProviderConfig;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openai").unwrap().contains("api.openai.com"));
        assert!(default_base_url("openrouter").unwrap().contains("openrouter.ai"));
        assert!(default_base_url("ollama").unwrap().contains("localhost:11434"));
        assert!(default_base_url("acme").is_none());
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn build_anthropic() {
        let config = AppConfig {
            provider: "anthropic".into(),
            api_key: Some("sk-ant".into()),
            ..AppConfig::default()
        };
        assert_eq!(build_from_config(&config).unwrap().name(), "anthropic");
    }

    #[test]
    fn unknown_provider_needs_url() {
        let mut config = AppConfig {
            provider: "acme".into(),
            ..AppConfig::default()
        };
        assert!(matches!(
            build_from_config(&config),
            Err(ProviderError::NotConfigured(_))
        ));

        config.providers.insert(
            "acme".into(),
            ProviderConfig {
                api_url: Some("http://llm.acme.internal/v1".into()),
                ..ProviderConfig::default()
            },
        );
        assert_eq!(build_from_config(&config).unwrap().name(), "acme");
    }
}
