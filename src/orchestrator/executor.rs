//! Step execution: workspace validation, component resolution, build calls.
//!
//! Stateless helpers driven by the orchestrator. Each build call updates the
//! orchestration state so the literal build order is auditable afterwards.

use std::path::Path;

use crate::error::{ClientError, Result};
use crate::models::{BuildStatus, Component, ComponentKind, PlatformConfig};
use crate::orchestrator::state::{OrchestrationState, SessionPhase};
use crate::session::Session;

/// Checks the workspace path before any session is opened.
///
/// The toolchain mishandles paths with embedded whitespace, so reject them
/// here rather than surface an opaque vendor error mid-run.
pub fn validate_workspace_path(workspace: &Path) -> Result<(), ClientError> {
    let raw = workspace.to_string_lossy();
    if raw.trim().is_empty() {
        return Err(ClientError::Environment(
            "workspace path is empty".to_string(),
        ));
    }
    if raw.chars().any(|c| c.is_whitespace()) {
        return Err(ClientError::Environment(format!(
            "workspace path contains whitespace: '{}'",
            raw
        )));
    }
    Ok(())
}

/// Resolve a component by name, recording it in the orchestration state.
pub fn resolve_component(
    session: &mut Session,
    state: &mut OrchestrationState,
    name: &str,
) -> Result<Component> {
    let component = session.get_component(name)?;
    state.transition_to(SessionPhase::ComponentsReady)?;
    state.record_component(name);
    Ok(component)
}

/// Resolve the platform by name, creating it if the workspace does not have
/// it yet. Retrieval after creation in the same session is how the observed
/// transcripts do it, and it confirms the registry took the definition.
pub fn ensure_platform(
    session: &mut Session,
    state: &mut OrchestrationState,
    config: &PlatformConfig,
) -> Result<Component> {
    match session.get_component(&config.name) {
        Ok(existing) => {
            if existing.kind != ComponentKind::Platform {
                return Err(ClientError::Environment(format!(
                    "component '{}' exists but is {}, not a platform",
                    config.name, existing.kind
                ))
                .into());
            }
            log::info!("platform '{}' already present, reusing", config.name);
            state.transition_to(SessionPhase::ComponentsReady)?;
            state.record_component(&config.name);
            Ok(existing)
        }
        Err(ClientError::NotFound(_)) => {
            session.create_platform_component(config)?;
            let component = session.get_component(&config.name)?;
            state.transition_to(SessionPhase::ComponentsReady)?;
            state.record_component(&config.name);
            Ok(component)
        }
        Err(e) => Err(e.into()),
    }
}

/// Issue a blocking build for a resolved component.
///
/// The reported outcome lands in the orchestration state either way; a
/// toolchain failure propagates to the caller instead of being captured
/// into a dead status variable.
pub fn build_component(
    session: &mut Session,
    state: &mut OrchestrationState,
    component: &Component,
) -> Result<BuildStatus> {
    state.transition_to(SessionPhase::Building)?;
    match session.build(component) {
        Ok(status) => {
            state.record_build(&component.name, true);
            state.transition_to(SessionPhase::ComponentsReady)?;
            log::info!("build of {} succeeded", component);
            Ok(status)
        }
        Err(e) => {
            state.record_build(&component.name, false);
            log::error!("build of {} failed: {}", component, e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::InMemoryToolchain;
    use crate::models::{AdvancedOptions, Compiler, HwDesignRef, OsTarget};

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

    fn open_session(toolchain: &InMemoryToolchain, workspace: &Path) -> Session {
        Session::open(toolchain, workspace, None).unwrap()
    }

    #[test]
    fn test_validate_workspace_path() {
        assert!(validate_workspace_path(Path::new("vitiswork")).is_ok());
        assert!(validate_workspace_path(Path::new("")).is_err());
        assert!(validate_workspace_path(Path::new("my work")).is_err());
    }

    #[test]
    fn test_ensure_platform_creates_once_then_reuses() {
        let toolchain = InMemoryToolchain::new();
        let workspace = Path::new("vitiswork");
        let mut state = OrchestrationState::new(workspace);
        state.transition_to(SessionPhase::SessionOpen).unwrap();

        let mut session = open_session(&toolchain, workspace);
        let first = ensure_platform(&mut session, &mut state, &arty_config()).unwrap();
        let second = ensure_platform(&mut session, &mut state, &arty_config()).unwrap();
        assert_eq!(first, second);
        assert_eq!(state.components_resolved, vec!["ARTY", "ARTY"]);
    }

    #[test]
    fn test_resolve_component_missing_is_not_found() {
        let toolchain = InMemoryToolchain::new();
        let workspace = Path::new("vitiswork");
        let mut state = OrchestrationState::new(workspace);
        state.transition_to(SessionPhase::SessionOpen).unwrap();

        let mut session = open_session(&toolchain, workspace);
        let err = resolve_component(&mut session, &mut state, "app_component").unwrap_err();
        assert!(matches!(
            err,
            crate::error::OrchestratorError::Client(ClientError::NotFound(_))
        ));
        assert!(state.components_resolved.is_empty());
    }

    #[test]
    fn test_build_component_updates_state() {
        let toolchain = InMemoryToolchain::new();
        let workspace = Path::new("vitiswork");
        let mut state = OrchestrationState::new(workspace);
        state.transition_to(SessionPhase::SessionOpen).unwrap();

        let mut session = open_session(&toolchain, workspace);
        let platform = ensure_platform(&mut session, &mut state, &arty_config()).unwrap();
        let status = build_component(&mut session, &mut state, &platform).unwrap();

        assert!(status.ok());
        assert_eq!(state.phase, SessionPhase::ComponentsReady);
        assert_eq!(state.build_order, vec!["ARTY"]);
        assert_eq!(state.builds_succeeded, 1);
    }

    #[test]
    fn test_build_failure_recorded_and_propagated() {
        let toolchain = InMemoryToolchain::new();
        let workspace = Path::new("vitiswork");
        let mut state = OrchestrationState::new(workspace);
        state.transition_to(SessionPhase::SessionOpen).unwrap();

        let mut session = open_session(&toolchain, workspace);
        let platform = ensure_platform(&mut session, &mut state, &arty_config()).unwrap();
        toolchain.poison_component(workspace, "ARTY").unwrap();

        let err = build_component(&mut session, &mut state, &platform).unwrap_err();
        assert!(matches!(
            err,
            crate::error::OrchestratorError::Client(ClientError::BuildFailure { .. })
        ));
        assert_eq!(state.builds_failed, 1);
        // Phase stays Building; close is still a legal next transition.
        assert_eq!(state.phase, SessionPhase::Building);
        assert!(state.phase.can_transition_to(SessionPhase::SessionClosed));
    }
}
