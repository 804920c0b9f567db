//! Named build workflows.
//!
//! The observed sessions against the toolchain fall into three shapes:
//! provision a platform and build it, rebuild platform then application, and
//! the same rebuild followed by a second platform build that picks up the
//! application's artifacts. That trailing rebuild is easy to mistake for an
//! accidental repetition, so it is a named step here: `RefreshPlatform`.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;
use crate::models::{validate_name, PlatformConfig};

/// One step of a build workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    /// Resolve the platform by name, creating it if the workspace does not
    /// have it yet.
    EnsurePlatform,
    /// Build the platform component.
    BuildPlatform,
    /// Build the application component.
    BuildApplication,
    /// Rebuild the platform after the application has been built, so the
    /// platform picks up dependent artifacts.
    RefreshPlatform,
}

impl WorkflowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::EnsurePlatform => "ensure_platform",
            WorkflowStep::BuildPlatform => "build_platform",
            WorkflowStep::BuildApplication => "build_application",
            WorkflowStep::RefreshPlatform => "refresh_platform",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, ordered build workflow against one workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub workspace: PathBuf,
    pub platform: PlatformConfig,
    /// Name of the application component, when any step builds it. The
    /// application itself is created outside these workflows (in the IDE)
    /// and only retrieved by name here.
    pub application: Option<String>,
    pub steps: Vec<WorkflowStep>,
}

impl Workflow {
    /// Provision a fresh workspace: create the platform if needed, build it.
    pub fn provision(workspace: impl Into<PathBuf>, platform: PlatformConfig) -> Self {
        Workflow {
            workspace: workspace.into(),
            platform,
            application: None,
            steps: vec![WorkflowStep::EnsurePlatform, WorkflowStep::BuildPlatform],
        }
    }

    /// Rebuild platform then application, assuming both already exist.
    pub fn rebuild(
        workspace: impl Into<PathBuf>,
        platform: PlatformConfig,
        application: impl Into<String>,
    ) -> Self {
        Workflow {
            workspace: workspace.into(),
            platform,
            application: Some(application.into()),
            steps: vec![WorkflowStep::BuildPlatform, WorkflowStep::BuildApplication],
        }
    }

    /// Rebuild platform and application, then refresh the platform so it
    /// picks up the application's artifacts.
    pub fn rebuild_with_refresh(
        workspace: impl Into<PathBuf>,
        platform: PlatformConfig,
        application: impl Into<String>,
    ) -> Self {
        Workflow {
            workspace: workspace.into(),
            platform,
            application: Some(application.into()),
            steps: vec![
                WorkflowStep::BuildPlatform,
                WorkflowStep::BuildApplication,
                WorkflowStep::RefreshPlatform,
            ],
        }
    }

    /// Check the workflow before any session is opened.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.steps.is_empty() {
            return Err(OrchestratorError::InvalidWorkflow(
                "workflow has no steps".to_string(),
            ));
        }
        self.platform
            .validate()
            .map_err(|e| OrchestratorError::InvalidWorkflow(e.to_string()))?;
        if let Some(ref application) = self.application {
            validate_name(application)
                .map_err(|e| OrchestratorError::InvalidWorkflow(e.to_string()))?;
        }

        let mut application_built = false;
        for step in &self.steps {
            match step {
                WorkflowStep::BuildApplication => {
                    if self.application.is_none() {
                        return Err(OrchestratorError::InvalidWorkflow(
                            "build_application step without an application name".to_string(),
                        ));
                    }
                    application_built = true;
                }
                WorkflowStep::RefreshPlatform => {
                    // A refresh only makes sense once there are application
                    // artifacts to pick up.
                    if !application_built {
                        return Err(OrchestratorError::InvalidWorkflow(
                            "refresh_platform step before any build_application".to_string(),
                        ));
                    }
                }
                WorkflowStep::EnsurePlatform | WorkflowStep::BuildPlatform => {}
            }
        }
        Ok(())
    }
}
