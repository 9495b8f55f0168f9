//! Error handling - Zero-cost, hierarchical errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error hierarchy for the orchestrator and its collaborators.
///
/// Per-exchange failures are converted to sentinel strings at the lowest
/// layer (signer, adapter) so fan-out operations never abort early. Only
/// registry construction and a total execution failure reach the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (bad address, unparseable key, invalid entry)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/IO errors (aggregator HTTP endpoints)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Node RPC errors - timeouts, estimation failures; recoverable,
    /// callers retry with backoff
    #[error("Chain error: {0}")]
    Chain(String),

    /// Token metadata / resolution errors
    #[error("Token error: {0}")]
    Token(String),

    /// Allowance query or approval transaction failure
    #[error("Approval error: {0}")]
    Approval(String),

    /// Signing or broadcast failure
    #[error("Sign error: {0}")]
    Sign(String),

    /// All configured exchanges failed to produce a swap
    #[error("Execution error: {0}")]
    Execution(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
