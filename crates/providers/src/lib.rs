//! Completion provider implementations for ClinicChat.
//!
//! All providers implement the `clinicchat_core::Provider` trait.
//! `router::build_from_config` picks the one named in configuration.

pub mod anthropic;
pub mod openai_compat;
pub mod router;

pub use anthropic::AnthropicProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
