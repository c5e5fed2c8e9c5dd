//! Response classification: every gateway outcome maps to exactly one
//! `CompletionOutcome`.
//!
//! Quota detection goes through `QuotaSignal`, so the classifier never
//! looks at a vendor's error codes. Usage and model metadata are dropped
//! here.

use clinicchat_core::error::{ChatError, QuotaSignal};
use clinicchat_core::provider::CompletionResponse;

/// What a single chat exchange produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Success { text: String },
    QuotaExceeded,
    /// `detail` is for logs only; its wording is not stable.
    Failure { detail: String },
}

impl CompletionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CompletionOutcome::Success { .. })
    }

    /// Convert into the caller-facing result.
    pub fn into_result(self) -> Result<String, ChatError> {
        match self {
            CompletionOutcome::Success { text } => Ok(text),
            CompletionOutcome::QuotaExceeded => Err(ChatError::QuotaExceeded),
            CompletionOutcome::Failure { detail } => Err(ChatError::ProviderFailure(detail)),
        }
    }
}

/// Classify a raw gateway result.
pub fn classify<E>(raw: Result<CompletionResponse, E>) -> CompletionOutcome
where
    E: QuotaSignal + std::fmt::Display,
{
    match raw {
        Err(e) if e.is_quota_exhausted() => CompletionOutcome::QuotaExceeded,
        Err(e) => CompletionOutcome::Failure {
            detail: e.to_string(),
        },
        Ok(response) => classify_response(response),
    }
}

fn classify_response(response: CompletionResponse) -> CompletionOutcome {
    let Some(first) = response.candidates.into_iter().next() else {
        return CompletionOutcome::Failure {
            detail: "provider returned no candidates".into(),
        };
    };

    match first.text {
        Some(text) if !text.is_empty() => CompletionOutcome::Success { text },
        _ => CompletionOutcome::Failure {
            detail: format!(
                "first candidate carried no text (finish_reason: {})",
                first.finish_reason.as_deref().unwrap_or("none")
            ),
        },
    }
}
