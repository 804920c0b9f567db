//! Unified error type hierarchy for Forgebench
//!
//! Provides structured error handling with ClientError, OrchestratorError,
//! and ConfigError.

use std::io;
use thiserror::Error;

/// Errors reported by the external toolchain boundary.
///
/// These mirror the failure modes of the vendor build client: a workspace the
/// toolchain cannot use, component registry mismatches, a missing hardware
/// design artifact, and toolchain-reported build failures.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Workspace unusable or toolchain unavailable: {0}")]
    Environment(String),

    #[error("Component '{0}' already exists in this workspace")]
    DuplicateName(String),

    #[error("Component '{0}' not found in this workspace")]
    NotFound(String),

    #[error("Hardware design artifact cannot be located: {0}")]
    InvalidReference(String),

    /// A build that the toolchain reported as failed. Never swallowed:
    /// callers receive this as an `Err`, not as a status flag to ignore.
    #[error("Build of '{component}' failed: {diagnostics}")]
    BuildFailure {
        component: String,
        diagnostics: String,
    },

    #[error("IO error at the toolchain boundary: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    /// True for registry mismatches that an `ensure`-style step may recover
    /// from (a missing component can be created; a duplicate can be reused).
    pub fn is_registry_mismatch(&self) -> bool {
        matches!(
            self,
            ClientError::NotFound(_) | ClientError::DuplicateName(_)
        )
    }
}

/// Errors raised by the session orchestrator itself.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Invalid session phase transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Workflow rejected: {0}")]
    InvalidWorkflow(String),

    #[error("Session is already closed")]
    SessionClosed,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Bench configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Bench config file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in bench config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Bench config validation failed: {0}")]
    ValidationFailed(String),

    #[error("Unrecognized advanced option '{0}'")]
    UnknownOption(String),

    #[error("Invalid value '{value}' for advanced option '{key}'")]
    InvalidOptionValue { key: String, value: String },

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Top-level result type for orchestration operations.
/// The error defaults to [`OrchestratorError`]; boundary code narrows it,
/// e.g. `Result<Component, ClientError>`.
pub type Result<T, E = OrchestratorError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::NotFound("app_component".to_string());
        assert_eq!(
            err.to_string(),
            "Component 'app_component' not found in this workspace"
        );
    }

    #[test]
    fn test_build_failure_display() {
        let err = ClientError::BuildFailure {
            component: "ARTY".to_string(),
            diagnostics: "linker returned 1".to_string(),
        };
        assert_eq!(err.to_string(), "Build of 'ARTY' failed: linker returned 1");
    }

    #[test]
    fn test_registry_mismatch_classification() {
        assert!(ClientError::NotFound("x".into()).is_registry_mismatch());
        assert!(ClientError::DuplicateName("x".into()).is_registry_mismatch());
        assert!(!ClientError::Environment("x".into()).is_registry_mismatch());
    }

    #[test]
    fn test_orchestrator_error_wraps_client_error() {
        let err: OrchestratorError = ClientError::NotFound("ARTY".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Component 'ARTY' not found in this workspace"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::UnknownOption("dt_overlays".to_string());
        assert_eq!(err.to_string(), "Unrecognized advanced option 'dt_overlays'");
    }
}
