//! Build Session Orchestration: fixed-order component builds within a scoped
//! session (SessionOpen -> ComponentsReady -> Building -> SessionClosed).

pub mod executor;
pub mod state;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use executor::{build_component, ensure_platform, resolve_component, validate_workspace_path};
pub use state::{OrchestrationState, SessionPhase};

use crate::client::Toolchain;
use crate::error::Result;
use crate::journal::Journal;
use crate::models::{BuildStatus, Component};
use crate::session::{with_session, Session};
use crate::workflow::{Workflow, WorkflowStep};

/// Result of one executed workflow step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step: WorkflowStep,
    pub component: String,
    /// Build status for build steps; `None` for resolution-only steps.
    pub status: Option<BuildStatus>,
}

/// Summary of a completed workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub workspace: PathBuf,
    pub steps: Vec<StepReport>,
    pub state: OrchestrationState,
}

impl RunReport {
    /// Literal build order of the run, one entry per build call.
    pub fn build_order(&self) -> &[String] {
        &self.state.build_order
    }
}

/// Drives validated workflows against the external toolchain, one scoped
/// session per run.
///
/// The toolchain handle is injected, so the same orchestrator code runs
/// against the vendor client, the in-memory simulation, or a scripted double.
pub struct SessionOrchestrator {
    toolchain: Box<dyn Toolchain>,
    journal: Option<Journal>,
}

impl SessionOrchestrator {
    pub fn new(toolchain: Box<dyn Toolchain>) -> Self {
        SessionOrchestrator {
            toolchain,
            journal: None,
        }
    }

    /// Attach a session journal; every boundary call of subsequent runs is
    /// recorded there.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Execute a workflow inside one session.
    ///
    /// The session is closed on every exit path. Any build failure aborts
    /// the remaining steps and propagates; partial progress stays visible in
    /// the orchestration state the error path logs.
    pub fn run(&self, workflow: &Workflow) -> Result<RunReport> {
        workflow.validate()?;
        validate_workspace_path(&workflow.workspace)?;

        log::info!(
            "starting workflow [{}] against workspace {}",
            workflow
                .steps
                .iter()
                .map(WorkflowStep::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            workflow.workspace.display()
        );

        let mut state = OrchestrationState::new(&workflow.workspace);
        let result = with_session(
            self.toolchain.as_ref(),
            &workflow.workspace,
            self.journal.clone(),
            |session| {
                state.transition_to(SessionPhase::SessionOpen)?;
                let mut run = StepRunner {
                    session,
                    state: &mut state,
                    workflow,
                    platform: None,
                    application: None,
                };
                let mut reports = Vec::with_capacity(workflow.steps.len());
                for step in &workflow.steps {
                    reports.push(run.execute(*step)?);
                }
                Ok(reports)
            },
        );

        match result {
            Ok(steps) => {
                state.transition_to(SessionPhase::SessionClosed)?;
                log::info!(
                    "workflow complete: {} build(s), order [{}]",
                    state.builds_succeeded,
                    state.build_order.join(", ")
                );
                Ok(RunReport {
                    workspace: workflow.workspace.clone(),
                    steps,
                    state,
                })
            }
            Err(e) => {
                state.record_error(e.to_string());
                if let Err(transition_err) = state.transition_to(SessionPhase::SessionClosed) {
                    log::warn!("state close transition rejected: {}", transition_err);
                }
                log::error!(
                    "workflow aborted after {} build(s): {}",
                    state.build_order.len(),
                    e
                );
                Err(e)
            }
        }
    }
}

/// Per-run execution context: resolved component handles are cached so a
/// refresh step rebuilds the same handle the first build used.
struct StepRunner<'a, 'b> {
    session: &'a mut Session,
    state: &'a mut OrchestrationState,
    workflow: &'b Workflow,
    platform: Option<Component>,
    application: Option<Component>,
}

impl StepRunner<'_, '_> {
    fn execute(&mut self, step: WorkflowStep) -> Result<StepReport> {
        match step {
            WorkflowStep::EnsurePlatform => {
                let platform =
                    ensure_platform(self.session, self.state, &self.workflow.platform)?;
                let name = platform.name.clone();
                self.platform = Some(platform);
                Ok(StepReport {
                    step,
                    component: name,
                    status: None,
                })
            }
            WorkflowStep::BuildPlatform | WorkflowStep::RefreshPlatform => {
                let platform = self.platform_handle()?;
                let status = build_component(self.session, self.state, &platform)?;
                Ok(StepReport {
                    step,
                    component: platform.name,
                    status: Some(status),
                })
            }
            WorkflowStep::BuildApplication => {
                let application = self.application_handle()?;
                let status = build_component(self.session, self.state, &application)?;
                Ok(StepReport {
                    step,
                    component: application.name,
                    status: Some(status),
                })
            }
        }
    }

    fn platform_handle(&mut self) -> Result<Component> {
        if let Some(ref platform) = self.platform {
            return Ok(platform.clone());
        }
        let platform =
            resolve_component(self.session, self.state, &self.workflow.platform.name)?;
        self.platform = Some(platform.clone());
        Ok(platform)
    }

    fn application_handle(&mut self) -> Result<Component> {
        if let Some(ref application) = self.application {
            return Ok(application.clone());
        }
        // validate() guarantees the name is present for application steps.
        let name = self
            .workflow
            .application
            .as_deref()
            .ok_or_else(|| {
                crate::error::OrchestratorError::InvalidWorkflow(
                    "build_application step without an application name".to_string(),
                )
            })?
            .to_string();
        let application = resolve_component(self.session, self.state, &name)?;
        self.application = Some(application.clone());
        Ok(application)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::InMemoryToolchain;
    use crate::error::{ClientError, OrchestratorError};
    use crate::models::{
        AdvancedOptions, Compiler, ComponentKind, HwDesignRef, OsTarget, PlatformConfig,
    };
    use std::path::Path;

    fn arty_config() -> PlatformConfig {
        PlatformConfig {
            name: "ARTY".to_string(),
            hw_design: HwDesignRef::new("$COMPONENT_LOCATION/../hw/artyz7_20_platform.xsa"),
            os: OsTarget::Standalone,
            cpu: "ps7_cortexa9_0".to_string(),
            domain_name: "standalone_ps7_cortexa9_0".to_string(),
            generate_dtb: false,
            compiler: Compiler::Gcc,
            advanced: AdvancedOptions::default(),
        }
    }

    #[test]
    fn test_provision_run() {
        let toolchain = InMemoryToolchain::new();
        let orchestrator = SessionOrchestrator::new(Box::new(toolchain.clone()));

        let report = orchestrator
            .run(&Workflow::provision("vitiswork", arty_config()))
            .unwrap();

        assert_eq!(report.build_order(), ["ARTY"]);
        assert_eq!(report.state.phase, SessionPhase::SessionClosed);
        assert_eq!(toolchain.builds_completed(Path::new("vitiswork"), "ARTY"), 1);
        assert_eq!(toolchain.session_counts(), (1, 1));
    }

    #[test]
    fn test_provision_then_refresh_scenario() {
        // Session one creates and builds ARTY; session two rebuilds it, builds
        // the app, then refreshes the platform - the literal observed order.
        let toolchain = InMemoryToolchain::new();
        let workspace = Path::new("vitiswork");
        toolchain
            .seed_component(workspace, "app_component", ComponentKind::Application)
            .unwrap();
        let orchestrator = SessionOrchestrator::new(Box::new(toolchain.clone()));

        orchestrator
            .run(&Workflow::provision("vitiswork", arty_config()))
            .unwrap();
        let report = orchestrator
            .run(&Workflow::rebuild_with_refresh(
                "vitiswork",
                arty_config(),
                "app_component",
            ))
            .unwrap();

        assert_eq!(report.build_order(), ["ARTY", "app_component", "ARTY"]);
        assert_eq!(toolchain.builds_completed(workspace, "ARTY"), 3);
        assert_eq!(toolchain.builds_completed(workspace, "app_component"), 1);
        assert_eq!(toolchain.session_counts(), (2, 2));
    }

    #[test]
    fn test_missing_application_is_not_found_and_session_closes() {
        let toolchain = InMemoryToolchain::new();
        let orchestrator = SessionOrchestrator::new(Box::new(toolchain.clone()));
        orchestrator
            .run(&Workflow::provision("vitiswork", arty_config()))
            .unwrap();

        let err = orchestrator
            .run(&Workflow::rebuild("vitiswork", arty_config(), "app_component"))
            .unwrap_err();

        assert!(matches!(
            err,
            OrchestratorError::Client(ClientError::NotFound(name)) if name == "app_component"
        ));
        assert_eq!(toolchain.session_counts(), (2, 2));
    }

    #[test]
    fn test_build_failure_aborts_and_session_closes() {
        let toolchain = InMemoryToolchain::new();
        let workspace = Path::new("vitiswork");
        toolchain
            .seed_component(workspace, "app_component", ComponentKind::Application)
            .unwrap();
        let orchestrator = SessionOrchestrator::new(Box::new(toolchain.clone()));
        orchestrator
            .run(&Workflow::provision("vitiswork", arty_config()))
            .unwrap();
        toolchain.poison_component(workspace, "ARTY").unwrap();

        let err = orchestrator
            .run(&Workflow::rebuild_with_refresh(
                "vitiswork",
                arty_config(),
                "app_component",
            ))
            .unwrap_err();

        assert!(matches!(
            err,
            OrchestratorError::Client(ClientError::BuildFailure { .. })
        ));
        // The app build never ran; the platform failure aborted the workflow.
        assert_eq!(toolchain.builds_completed(workspace, "app_component"), 0);
        assert_eq!(toolchain.session_counts(), (2, 2));
    }

    #[test]
    fn test_invalid_workflow_opens_no_session() {
        let toolchain = InMemoryToolchain::new();
        let orchestrator = SessionOrchestrator::new(Box::new(toolchain.clone()));

        let mut workflow = Workflow::provision("vitiswork", arty_config());
        workflow.steps.clear();
        assert!(orchestrator.run(&workflow).is_err());
        assert_eq!(toolchain.session_counts(), (0, 0));
    }

    #[test]
    fn test_invalid_workspace_opens_no_session() {
        let toolchain = InMemoryToolchain::new();
        let orchestrator = SessionOrchestrator::new(Box::new(toolchain.clone()));

        let err = orchestrator
            .run(&Workflow::provision("vitis work", arty_config()))
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Client(ClientError::Environment(_))
        ));
        assert_eq!(toolchain.session_counts(), (0, 0));
    }

    #[test]
    fn test_duplicate_platform_is_reused_not_recreated() {
        let toolchain = InMemoryToolchain::new();
        let orchestrator = SessionOrchestrator::new(Box::new(toolchain.clone()));

        orchestrator
            .run(&Workflow::provision("vitiswork", arty_config()))
            .unwrap();
        // Second provision run must reuse the existing platform.
        let report = orchestrator
            .run(&Workflow::provision("vitiswork", arty_config()))
            .unwrap();

        assert_eq!(report.build_order(), ["ARTY"]);
        assert_eq!(toolchain.builds_completed(Path::new("vitiswork"), "ARTY"), 2);
    }

    #[test]
    fn test_step_reports_carry_statuses() {
        let toolchain = InMemoryToolchain::new();
        let orchestrator = SessionOrchestrator::new(Box::new(toolchain));

        let report = orchestrator
            .run(&Workflow::provision("vitiswork", arty_config()))
            .unwrap();

        assert_eq!(report.steps.len(), 2);
        assert!(report.steps[0].status.is_none());
        assert!(report.steps[1].status.as_ref().unwrap().ok());
    }
}
