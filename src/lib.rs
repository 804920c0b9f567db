//! Forgebench
//!
//! Build session orchestration for an embedded platform toolchain workbench.
//! The external toolchain owns the hard parts - platform generation,
//! cross-compilation, device-tree handling; this crate owns the shallow but
//! leak-prone part: opening a workspace-scoped session, resolving or creating
//! named components, issuing builds in a fixed order, and closing the session
//! on every exit path.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Core data structures (components, platform config, status)
//! - **client**: The external toolchain boundary and its in-memory simulation
//! - **session**: Journaled RAII session wrapper over the boundary
//! - **workflow**: Named, validated build workflows
//! - **orchestrator**: Phase state machine and workflow execution
//! - **journal**: Durable per-session transcript of boundary calls
//! - **config**: JSON bench configuration for rehearsal runs

// Core foundational modules
pub mod error;
pub mod models;

// External toolchain boundary (trait seam + in-memory simulation)
pub mod client;

// Session lifetime management
pub mod session;

// Named build workflows
pub mod workflow;

// Phase state machine and workflow execution
pub mod orchestrator;

// Durable session transcript, also the global `log` sink
pub mod journal;

// Bench configuration for the rehearsal binary
pub mod config;

// Re-export the log crate for macro usage
pub use log;

// Re-export error types for easy access
pub use error::{ClientError, ConfigError, OrchestratorError, Result};

// Re-export model types for easy access
pub use models::{
    AdvancedOptions, BuildOutcome, BuildStatus, Compiler, Component, ComponentKind, HwDesignRef,
    OsTarget, PlatformConfig,
};

// Re-export the boundary traits and session helpers
pub use client::{Toolchain, ToolchainSession};
pub use session::{with_session, Session};

// Re-export workflow and orchestration types
pub use orchestrator::{
    OrchestrationState, RunReport, SessionOrchestrator, SessionPhase, StepReport,
};
pub use workflow::{Workflow, WorkflowStep};

// Re-export journal and config
pub use config::BenchConfig;
pub use journal::Journal;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
