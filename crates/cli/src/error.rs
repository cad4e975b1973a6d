//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or failed validation
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    /// Telemetry source could not be created
    #[error("Failed to open {kind} source: {message}")]
    Source { kind: String, message: String },

    /// Pipeline could not be assembled
    #[error("Pipeline execution failed: {message}")]
    PipelineExecution { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    pub fn source(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn pipeline_execution(message: impl Into<String>) -> Self {
        Self::PipelineExecution {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            CliError::config_not_found("a.toml").to_string(),
            "Configuration file not found: a.toml"
        );
        assert_eq!(
            CliError::source("replay", "empty").to_string(),
            "Failed to open replay source: empty"
        );
        assert!(CliError::pipeline_execution("sink 'x'")
            .to_string()
            .starts_with("Pipeline execution failed"));
    }
}
