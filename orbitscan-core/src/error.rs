//! Engine error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid canvas size {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },

    #[error("Boundary tracing unavailable: {0}")]
    BoundaryTracePrecondition(String),

    #[error("Resource exhausted: {0}")]
    Resource(String),

    #[error("Resume blob version {found} is not supported (expected {expected})")]
    ResumeVersion { found: u32, expected: u32 },

    #[error("Resume blob unusable: {0}")]
    ResumeCorrupt(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
