//! Layered error definitions
//!
//! Categorized by source: config / feed / surface / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Feed Errors =====
    /// Recorded feed line could not be decoded
    #[error("feed parse error at line {line}: {message}")]
    FeedParse { line: usize, message: String },

    /// Parameter value present but malformed
    #[error("parameter '{key}' is malformed: {message}")]
    ParamFormat { key: String, message: String },

    // ===== Surface Errors =====
    /// Map surface reported a load failure
    #[error("map surface load failed ({code}): {reason}")]
    SurfaceLoad { code: i32, reason: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create feed parse error
    pub fn feed_parse(line: usize, message: impl Into<String>) -> Self {
        Self::FeedParse {
            line,
            message: message.into(),
        }
    }

    /// Create parameter format error
    pub fn param_format(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParamFormat {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
