//! Completion gateway: one provider call per assembled request.
//!
//! Model, output limit and temperature are fixed at construction from the
//! process configuration. A failed call is returned as-is; there is no
//! retry here.

use std::sync::Arc;

use clinicchat_config::AssistantConfig;
use clinicchat_core::error::ProviderError;
use clinicchat_core::provider::{CompletionRequest, CompletionResponse, Provider};
use tracing::debug;

use crate::assembler::AssembledRequest;

/// Immutable sampling settings applied to every request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl From<&AssistantConfig> for CompletionSettings {
    fn from(config: &AssistantConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
        }
    }
}

/// Sends assembled conversations to the configured provider.
pub struct CompletionGateway {
    provider: Arc<dyn Provider>,
    settings: CompletionSettings,
}

impl CompletionGateway {
    pub fn new(provider: Arc<dyn Provider>, settings: CompletionSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Build the provider-facing request. Always asks for a single candidate.
    pub fn build_request(&self, assembled: &AssembledRequest) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            turns: assembled.sequence(),
            max_tokens: self.settings.max_output_tokens,
            temperature: self.settings.temperature,
            candidates: 1,
        }
    }

    /// Invoke the provider exactly once.
    pub async fn complete(
        &self,
        assembled: &AssembledRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = self.build_request(assembled);
        debug!(
            provider = %self.provider.name(),
            model = %request.model,
            turns = request.turns.len(),
            max_tokens = request.max_tokens,
            "Dispatching completion"
        );
        self.provider.complete(request).await
    }
}
