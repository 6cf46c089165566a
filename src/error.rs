//! Error types

use thiserror::Error;

/// Failure reported by an output backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Backend error: {0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Plotter errors
#[derive(Error, Debug)]
pub enum PlotError {
    /// Operation not allowed in the current plotter state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Viewport or matrix request with a singular linear part
    #[error("Singular transformation matrix")]
    SingularTransform,

    /// Arc geometry that cannot be drawn as requested
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Backend failed to consume an emission
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Failed to read a configuration file
    #[error("Failed to read config file: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// Failed to parse a configuration file
    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for plotter operations
pub type Result<T> = std::result::Result<T, PlotError>;
