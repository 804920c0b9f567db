//! Simulated toolchain backend with a persistent in-memory component store.
//!
//! `InMemoryToolchain` stands in for the vendor client during rehearsal runs
//! and tests. Its store outlives individual sessions, keyed by workspace path
//! and component name, which reproduces the registry behavior the real
//! toolchain persists on disk: create-then-build in one session,
//! retrieve-then-build in the next.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::client::{Toolchain, ToolchainSession};
use crate::error::ClientError;
use crate::models::{BuildStatus, Component, ComponentKind, PlatformConfig};

/// Component record held by the simulated store.
#[derive(Debug, Clone)]
struct StoredComponent {
    kind: ComponentKind,
    /// Directory the toolchain would assign the component inside the
    /// workspace; `$COMPONENT_LOCATION` resolves against this.
    location: PathBuf,
    /// Resolved hardware design path (platforms only).
    hw_design: Option<PathBuf>,
    builds_completed: u32,
    /// When set, the next builds of this component report failure.
    fail_builds: bool,
}

type WorkspaceStore = HashMap<String, StoredComponent>;

#[derive(Debug, Default)]
struct SharedState {
    workspaces: HashMap<PathBuf, WorkspaceStore>,
}

/// In-memory stand-in for the vendor build client.
///
/// Cloning yields a handle to the same store, so several sequential sessions
/// (or a test double alongside the orchestrator) observe the same components.
#[derive(Debug, Clone, Default)]
pub struct InMemoryToolchain {
    state: Arc<Mutex<SharedState>>,
    /// When true, `create_platform_component` requires the resolved hardware
    /// design artifact to exist on the real filesystem.
    check_artifacts: bool,
    sessions_opened: Arc<AtomicUsize>,
    sessions_closed: Arc<AtomicUsize>,
}

impl InMemoryToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable filesystem existence checks for hardware design artifacts.
    pub fn with_artifact_checks(mut self) -> Self {
        self.check_artifacts = true;
        self
    }

    /// Seed a component into a workspace, as if it had been created by an
    /// earlier session or directly in the IDE. Overwrites nothing.
    pub fn seed_component(
        &self,
        workspace: &Path,
        name: &str,
        kind: ComponentKind,
    ) -> Result<(), ClientError> {
        let mut state = self.lock();
        let store = state.workspaces.entry(workspace.to_path_buf()).or_default();
        if store.contains_key(name) {
            return Err(ClientError::DuplicateName(name.to_string()));
        }
        store.insert(
            name.to_string(),
            StoredComponent {
                kind,
                location: workspace.join(name),
                hw_design: None,
                builds_completed: 0,
                fail_builds: false,
            },
        );
        Ok(())
    }

    /// Mark a component so its builds report toolchain failure. Used to
    /// exercise failure propagation and teardown paths.
    pub fn poison_component(&self, workspace: &Path, name: &str) -> Result<(), ClientError> {
        let mut state = self.lock();
        let store = state
            .workspaces
            .get_mut(workspace)
            .ok_or_else(|| ClientError::NotFound(name.to_string()))?;
        let component = store
            .get_mut(name)
            .ok_or_else(|| ClientError::NotFound(name.to_string()))?;
        component.fail_builds = true;
        Ok(())
    }

    /// Resolved hardware design path recorded for a platform component.
    pub fn hw_design_of(&self, workspace: &Path, name: &str) -> Option<PathBuf> {
        self.lock()
            .workspaces
            .get(workspace)
            .and_then(|store| store.get(name))
            .and_then(|c| c.hw_design.clone())
    }

    /// Number of builds the store has completed for a component.
    pub fn builds_completed(&self, workspace: &Path, name: &str) -> u32 {
        self.lock()
            .workspaces
            .get(workspace)
            .and_then(|store| store.get(name))
            .map(|c| c.builds_completed)
            .unwrap_or(0)
    }

    /// `(opened, closed)` session counts, for leak accounting.
    pub fn session_counts(&self) -> (usize, usize) {
        (
            self.sessions_opened.load(Ordering::SeqCst),
            self.sessions_closed.load(Ordering::SeqCst),
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SharedState> {
        // Store mutex poisoning only happens if a holder panicked; the store
        // itself stays structurally valid, so keep going with the inner data.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Toolchain for InMemoryToolchain {
    fn open(&self, workspace: &Path) -> Result<Box<dyn ToolchainSession>, ClientError> {
        if workspace.as_os_str().is_empty() {
            return Err(ClientError::Environment(
                "workspace path is empty".to_string(),
            ));
        }
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        log::debug!("simulated session opened for {}", workspace.display());
        Ok(Box::new(MemorySession {
            toolchain: self.clone(),
            workspace: workspace.to_path_buf(),
            closed: false,
        }))
    }
}

/// One open session against the simulated store.
#[derive(Debug)]
struct MemorySession {
    toolchain: InMemoryToolchain,
    workspace: PathBuf,
    closed: bool,
}

impl MemorySession {
    fn ensure_open(&self) -> Result<(), ClientError> {
        if self.closed {
            Err(ClientError::Environment(
                "session has been closed".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl ToolchainSession for MemorySession {
    fn create_platform_component(
        &mut self,
        config: &PlatformConfig,
    ) -> Result<Component, ClientError> {
        self.ensure_open()?;
        config
            .validate()
            .map_err(|e| ClientError::InvalidReference(e.to_string()))?;

        let location = self.workspace.join(&config.name);
        let hw_design = config.hw_design.resolve(&location);
        if self.toolchain.check_artifacts && !hw_design.exists() {
            return Err(ClientError::InvalidReference(
                hw_design.display().to_string(),
            ));
        }

        let mut state = self.toolchain.lock();
        let store = state.workspaces.entry(self.workspace.clone()).or_default();
        if store.contains_key(&config.name) {
            return Err(ClientError::DuplicateName(config.name.clone()));
        }
        store.insert(
            config.name.clone(),
            StoredComponent {
                kind: ComponentKind::Platform,
                location,
                hw_design: Some(hw_design),
                builds_completed: 0,
                fail_builds: false,
            },
        );
        log::info!(
            "created platform '{}' ({} on {})",
            config.name,
            config.os,
            config.cpu
        );
        Ok(Component::new(&config.name, ComponentKind::Platform))
    }

    fn get_component(&mut self, name: &str) -> Result<Component, ClientError> {
        self.ensure_open()?;
        let state = self.toolchain.lock();
        let stored = state
            .workspaces
            .get(&self.workspace)
            .and_then(|store| store.get(name))
            .ok_or_else(|| ClientError::NotFound(name.to_string()))?;
        Ok(Component::new(name, stored.kind))
    }

    fn build(&mut self, component: &Component) -> Result<BuildStatus, ClientError> {
        self.ensure_open()?;
        let mut state = self.toolchain.lock();
        let stored = state
            .workspaces
            .get_mut(&self.workspace)
            .and_then(|store| store.get_mut(&component.name))
            .ok_or_else(|| ClientError::NotFound(component.name.clone()))?;

        if stored.fail_builds {
            return Err(ClientError::BuildFailure {
                component: component.name.clone(),
                diagnostics: "simulated toolchain failure".to_string(),
            });
        }

        stored.builds_completed += 1;
        Ok(BuildStatus::success(format!(
            "{} '{}' build #{} complete ({})",
            stored.kind,
            component.name,
            stored.builds_completed,
            stored.location.display()
        )))
    }

    fn close(&mut self) -> Result<(), ClientError> {
        if !self.closed {
            self.closed = true;
            self.toolchain.sessions_closed.fetch_add(1, Ordering::SeqCst);
            log::debug!("simulated session closed for {}", self.workspace.display());
        }
        Ok(())
    }
}
