//! Layered error definitions
//!
//! Categorized by source: config / agent / telemetry

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

    // ===== Agent Errors =====
    /// Learning agent failure (training step, checkpoint)
    #[error("agent error during {operation}: {message}")]
    Agent { operation: String, message: String },

    // ===== Telemetry Errors =====
    /// Telemetry sink write error
    #[error("telemetry sink '{sink_name}' write error: {message}")]
    TelemetryWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
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

    /// Create agent error
    pub fn agent(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Agent {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create telemetry write error
    pub fn telemetry_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TelemetryWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
