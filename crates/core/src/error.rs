//! Error types for the ClinicChat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! `ProviderError` is the raw failure shape every completion backend maps
//! into; `ChatError` is the caller-facing taxonomy.

use thiserror::Error;

/// Caller-visible failure of a single chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// The request was malformed (empty or missing message).
    /// Detected before any provider call is made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider reported a billing or rate limit. Callers should back off.
    #[error("Provider quota exceeded")]
    QuotaExceeded,

    /// Any other provider-side or transport-side failure.
    #[error("Provider failure: {0}")]
    ProviderFailure(String),
}

/// Result type alias using `ChatError`.
pub type Result<T> = std::result::Result<T, ChatError>;

// --- Provider errors ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Quota exhausted ({code}): {message}")]
    QuotaExceeded { code: String, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Capability check for "the provider told us to stop spending".
///
/// The classifier asks this question instead of matching on a particular
/// vendor's error code, so each provider integration decides which of its
/// own failure shapes count as quota exhaustion when it builds the error.
pub trait QuotaSignal {
    fn is_quota_exhausted(&self) -> bool;
}

impl QuotaSignal for ProviderError {
    fn is_quota_exhausted(&self) -> bool {
        matches!(
            self,
            ProviderError::QuotaExceeded { .. } | ProviderError::RateLimited { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 503,
            message: "upstream overloaded".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("upstream overloaded"));
    }

    #[test]
    fn quota_and_rate_limit_are_quota_signals() {
        let quota = ProviderError::QuotaExceeded {
            code: "insufficient_quota".into(),
            message: "You exceeded your current quota".into(),
        };
        let rate = ProviderError::RateLimited { retry_after_secs: 20 };
        assert!(quota.is_quota_exhausted());
        assert!(rate.is_quota_exhausted());
    }

    #[test]
    fn other_failures_are_not_quota_signals() {
        let errors = [
            ProviderError::Network("connection reset".into()),
            ProviderError::Timeout("120s".into()),
            ProviderError::AuthenticationFailed("bad key".into()),
            ProviderError::InvalidResponse("no choices".into()),
            ProviderError::ApiError {
                status_code: 500,
                message: "boom".into(),
            },
        ];
        for err in errors {
            assert!(!err.is_quota_exhausted(), "{err} must not be a quota signal");
        }
    }

    #[test]
    fn chat_error_displays_correctly() {
        let err = ChatError::InvalidInput("Message is required".into());
        assert!(err.to_string().contains("Message is required"));
        assert_eq!(ChatError::QuotaExceeded.to_string(), "Provider quota exceeded");
    }
}
