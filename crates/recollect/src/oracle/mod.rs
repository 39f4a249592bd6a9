//! Reasoning oracle interface
//!
//! The oracle is a stateless text-completion service: one prompt in, one
//! free-form reply out. Engines depend only on the trait; the shipped
//! [`remote::RemoteOracle`] adapter covers OpenAI-compatible APIs. Any
//! logging around oracle calls lives with the caller, never inside the
//! completion itself.

pub mod remote;
pub mod tags;

use async_trait::async_trait;

pub use remote::RemoteOracle;
pub use tags::extract_block;

/// Oracle-specific errors
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Empty response")]
    Empty,
}

/// Trait for reasoning oracles
///
/// One blocking request/response per call, no retry, no memory of prior
/// calls. Engines treat every `Err` as "empty round" and degrade; the
/// underlying cause never propagates past the engine boundary.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Complete a prompt under a system instruction at the given
    /// sampling temperature.
    async fn complete(
        &self,
        prompt: &str,
        system_instruction: &str,
        temperature: f32,
    ) -> Result<String, OracleError>;

    /// Oracle name for logging
    fn name(&self) -> &'static str;
}
