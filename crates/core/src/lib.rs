//! # ClinicChat Core
//!
//! Domain types, traits, and error definitions for the ClinicChat medical
//! assistant gateway. This crate has **no framework dependencies**; it
//! defines the domain model that all other crates implement against.
//!
//! The completion backend is a trait here; implementations live in
//! `clinicchat-providers`, so the assistant can be tested against stubs
//! and switched between vendors via configuration.

pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{ChatError, ProviderError, QuotaSignal, Result};
pub use message::{ConversationRequest, Role, Turn};
pub use provider::{Candidate, CompletionRequest, CompletionResponse, Provider, Usage};
