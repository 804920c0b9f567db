//! Session State Management and Phase Tracking
//!
//! State tracking structures used by the session orchestrator to manage a
//! workflow run against one workspace.
//!
//! **Architecture**:
//! - `SessionPhase`: Enum representing discrete phases of a session
//! - `OrchestrationState`: Struct tracking current phase, resolved components,
//!   and the literal build order
//! - Phase transitions are validated by the orchestrator before applying

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::OrchestratorError;

/// Session phase enumeration - discrete states in the session lifecycle.
///
/// The orchestrator transitions between these phases as it opens the
/// session, resolves components, issues builds, and closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No session established yet
    Uninitialized,

    /// Session open against the workspace, no components resolved
    SessionOpen,

    /// One or more components resolved; re-entrant as more are resolved
    ComponentsReady,

    /// A blocking build call is in flight
    Building,

    /// Session closed; terminal
    SessionClosed,
}

impl SessionPhase {
    /// Get the human-readable name for this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::SessionOpen => "session_open",
            SessionPhase::ComponentsReady => "components_ready",
            SessionPhase::Building => "building",
            SessionPhase::SessionClosed => "session_closed",
        }
    }

    /// Get all valid phase transitions FROM this phase.
    ///
    /// Close is reachable from every live phase; nothing leaves
    /// `SessionClosed`.
    pub fn valid_next_phases(&self) -> Vec<SessionPhase> {
        match self {
            SessionPhase::Uninitialized => {
                vec![SessionPhase::SessionOpen, SessionPhase::SessionClosed]
            }
            SessionPhase::SessionOpen => {
                vec![SessionPhase::ComponentsReady, SessionPhase::SessionClosed]
            }
            SessionPhase::ComponentsReady => vec![
                SessionPhase::ComponentsReady,
                SessionPhase::Building,
                SessionPhase::SessionClosed,
            ],
            SessionPhase::Building => {
                vec![SessionPhase::ComponentsReady, SessionPhase::SessionClosed]
            }
            SessionPhase::SessionClosed => vec![],
        }
    }

    /// Check if a transition to the given phase is valid.
    pub fn can_transition_to(&self, next: SessionPhase) -> bool {
        self.valid_next_phases().contains(&next)
    }
}

/// Execution state snapshot for one workflow run.
///
/// Maintained by the orchestrator; serializable so run reports can be
/// persisted or inspected after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationState {
    /// Current session phase
    pub phase: SessionPhase,

    /// Workspace the session is rooted at
    pub workspace: PathBuf,

    /// Names of components resolved so far, in resolution order
    pub components_resolved: Vec<String>,

    /// Literal build order: one entry per build call issued
    pub build_order: Vec<String>,

    /// Number of builds the toolchain reported as successful
    pub builds_succeeded: u32,

    /// Number of builds the toolchain reported as failed
    pub builds_failed: u32,

    /// Run start timestamp
    pub started_at: DateTime<Utc>,

    /// Last phase or record update timestamp
    pub last_update: DateTime<Utc>,

    /// Error message if the run failed
    pub error: Option<String>,
}

impl OrchestrationState {
    /// Create a new orchestration state for a workflow run.
    pub fn new(workspace: &Path) -> Self {
        let now = Utc::now();
        OrchestrationState {
            phase: SessionPhase::Uninitialized,
            workspace: workspace.to_path_buf(),
            components_resolved: Vec::new(),
            build_order: Vec::new(),
            builds_succeeded: 0,
            builds_failed: 0,
            started_at: now,
            last_update: now,
            error: None,
        }
    }

    /// Attempt to transition to the next phase.
    pub fn transition_to(&mut self, next_phase: SessionPhase) -> Result<(), OrchestratorError> {
        if !self.phase.can_transition_to(next_phase) {
            return Err(OrchestratorError::InvalidTransition {
                from: self.phase.as_str(),
                to: next_phase.as_str(),
            });
        }
        self.phase = next_phase;
        self.last_update = Utc::now();
        Ok(())
    }

    /// Record a component resolved within the session.
    pub fn record_component(&mut self, name: &str) {
        self.components_resolved.push(name.to_string());
        self.last_update = Utc::now();
    }

    /// Record a build call and its reported outcome.
    pub fn record_build(&mut self, name: &str, success: bool) {
        self.build_order.push(name.to_string());
        if success {
            self.builds_succeeded += 1;
        } else {
            self.builds_failed += 1;
        }
        self.last_update = Utc::now();
    }

    /// Record a run-level error.
    pub fn record_error(&mut self, error: String) {
        self.error = Some(error);
        self.last_update = Utc::now();
    }
}
