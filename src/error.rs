//! Error types for Gargantua.
//!
//! The physics core itself never fails: degenerate inputs are recovered by
//! clamping or by the fallback factor. What can fail is everything around
//! it (configuration, file loading, the runtime worker), and those errors
//! are strongly typed with thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Validation errors raised while checking a configuration.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Bounds for '{field}' are inverted: min ({min}) must not exceed max ({max})")]
    InvertedBounds {
        field: String,
        min: f64,
        max: f64,
    },

    #[error("Bounds for '{field}' must be finite and positive (min: {min}, max: {max})")]
    NonPositiveBounds {
        field: String,
        min: f64,
        max: f64,
    },

    #[error("Step for '{field}' must be finite and positive, got {step}")]
    InvalidStep {
        field: String,
        step: f64,
    },

    #[error("Default {value} for '{field}' lies outside [{min}, {max}]")]
    DefaultOutOfBounds {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Tick interval must be at least 1ms")]
    ZeroTickInterval,

    #[error("Queue capacity for '{queue}' must be at least 1")]
    ZeroCapacity {
        queue: String,
    },

    #[error("Acknowledgement timeout must be non-zero")]
    ZeroAckTimeout,
}

/// Execution errors raised by the session runtime.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Worker disconnected on path '{path}'")]
    Disconnected {
        path: String,
    },

    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Presenter failed: {message}")]
    Presenter {
        message: String,
    },

    #[error("Control queue '{path}' is full (capacity: {capacity})")]
    QueueFull {
        path: String,
        capacity: usize,
    },
}

/// Configuration loading errors.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {message}")]
    Parse {
        message: String,
    },
}

/// Top-level error type for Gargantua.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum GargantuaError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl GargantuaError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is a config error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias for Gargantua operations.
pub type GargantuaResult<T> = Result<T, GargantuaError>;
