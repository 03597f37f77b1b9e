//! Error types for the xhash engine
//!
//! Consensus-path functions (the codec, ASERT, the supply calculator)
//! treat impossible inputs as programmer errors and panic; everything
//! else returns a typed [`Error`] through the crate-wide [`Result`].

use thiserror::Error;

/// Configuration error subtypes
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} (expected: {expected})")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported config format: {path} (expected .yaml, .yml or .json)")]
    UnsupportedFormat { path: String },

    #[error("Validation failed: {message}")]
    ValidationError { message: String },
}

/// Main error type for the xhash engine
#[derive(Error, Debug)]
pub enum Error {
    /// The remote work exchange has been shut down. Every in-flight and
    /// subsequent request observes this sentinel.
    #[error("xhash stopped")]
    Stopped,

    /// No remote work exchange is configured on this node.
    #[error("not supported")]
    NotSupported,

    /// The sealing engine has not published a work package yet.
    #[error("no mining work available yet")]
    NoWork,

    /// A solution was submitted for a pow-hash with no pending work.
    #[error("work submitted but none pending for hash {hash}")]
    UnknownWork {
        /// The pow-hash the submission claimed.
        hash: String,
    },

    /// A submitted nonce/digest pair failed seal verification.
    #[error("invalid proof-of-work submitted for hash {hash}")]
    InvalidSeal {
        /// The pow-hash the submission claimed.
        hash: String,
    },

    /// A verified solution could not be handed to the sealing engine
    /// because its results queue is full or closed.
    #[error("sealing result is not being consumed by the engine")]
    ResultUnconsumed,

    /// Configuration errors with detailed context
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed byte or hex input for a core type
    #[error("Invalid {what}: {message}")]
    InvalidValue {
        /// Which value failed to parse.
        what: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// Test-vector file parse failures, with file and line context
    #[error("{file}:{line}: {message}")]
    VectorFormat {
        /// Path of the offending run file.
        file: String,
        /// 1-based line number.
        line: usize,
        /// What failed to parse.
        message: String,
    },

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the xhash engine
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a generic configuration validation error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(ConfigError::ValidationError {
            message: msg.into(),
        })
    }

    /// Create an invalid-value error for a named core type
    pub fn invalid_value(what: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            what,
            message: message.into(),
        }
    }

    /// Create a vector-format error carrying file and line context
    pub fn vector_format(
        file: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::VectorFormat {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// Whether this error is the shutdown sentinel
    pub fn is_stopped(&self) -> bool {
        matches!(self, Error::Stopped)
    }

    /// Whether this error rejects a submitted solution. Rejections are
    /// collapsed to `false` at the public submit boundary.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::UnknownWork { .. } | Error::InvalidSeal { .. } | Error::ResultUnconsumed
        )
    }

    /// Get the error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Stopped => "stopped",
            Error::NotSupported => "not_supported",
            Error::NoWork => "no_work",
            Error::UnknownWork { .. } | Error::InvalidSeal { .. } | Error::ResultUnconsumed => {
                "rejected"
            }
            Error::Config(_) => "configuration",
            Error::InvalidValue { .. } => "validation",
            Error::VectorFormat { .. } => "vector_format",
            Error::Json(_) | Error::Yaml(_) => "serialization",
            Error::Io(_) => "io",
        }
    }
}
