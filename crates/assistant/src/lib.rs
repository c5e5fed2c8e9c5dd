//! Medical assistant core for ClinicChat.
//!
//! One exchange runs through three stages:
//!
//! 1. **Assembler**: directive + caller history + new user message
//! 2. **Gateway**: a single provider call with fixed sampling settings
//! 3. **Classifier**: success, quota exhaustion, or failure
//!
//! Nothing is kept between exchanges; `MedicalAssistant` can be shared
//! behind an `Arc` across concurrent requests.

pub mod assembler;
pub mod classifier;
pub mod gateway;

pub use assembler::{AssembledRequest, DECLINE_SENTENCE, MEDICAL_DIRECTIVE, assemble};
pub use classifier::{CompletionOutcome, classify};
pub use gateway::{CompletionGateway, CompletionSettings};

use std::sync::Arc;

use clinicchat_config::AppConfig;
use clinicchat_core::error::ChatError;
use clinicchat_core::message::ConversationRequest;
use clinicchat_core::provider::Provider;
use tracing::{info, warn};

/// Facade composing the three stages.
pub struct MedicalAssistant {
    gateway: CompletionGateway,
}

impl MedicalAssistant {
    pub fn new(provider: Arc<dyn Provider>, settings: CompletionSettings) -> Self {
        Self {
            gateway: CompletionGateway::new(provider, settings),
        }
    }

    /// Build from process configuration.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, CompletionSettings::from(&config.assistant))
    }

    pub fn settings(&self) -> &CompletionSettings {
        self.gateway.settings()
    }

    pub fn provider_name(&self) -> &str {
        self.gateway.provider_name()
    }

    /// Run one exchange and return the classified outcome.
    ///
    /// Invalid input is reported before the provider is contacted.
    pub async fn exchange(
        &self,
        request: &ConversationRequest,
    ) -> Result<CompletionOutcome, ChatError> {
        let assembled = assemble(request.message.as_deref(), &request.history)?;

        info!(
            provider = %self.gateway.provider_name(),
            history_len = request.history.len(),
            "Medical chat request"
        );

        let outcome = classifier::classify(self.gateway.complete(&assembled).await);

        match &outcome {
            CompletionOutcome::Success { text } => {
                info!(reply_len = text.len(), "Medical chat reply ready");
            }
            CompletionOutcome::QuotaExceeded => {
                warn!(provider = %self.gateway.provider_name(), "Provider quota exhausted");
            }
            CompletionOutcome::Failure { detail } => {
                warn!(provider = %self.gateway.provider_name(), detail = %detail, "Medical chat failed");
            }
        }

        Ok(outcome)
    }

    /// Run one exchange and return the reply text or a caller-facing error.
    pub async fn respond(&self, request: &ConversationRequest) -> Result<String, ChatError> {
        self.exchange(request).await?.into_result()
    }
}
