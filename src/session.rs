//! Session lifetime management.
//!
//! Wraps a raw [`ToolchainSession`] with two guarantees the raw boundary does
//! not give: every boundary call lands in the session journal, and the
//! session is closed exactly once on every exit path. The scripted sessions
//! this replaces leaked toolchain-side locks whenever a build call raised;
//! [`with_session`] makes that impossible.

use std::path::{Path, PathBuf};

use crate::client::{Toolchain, ToolchainSession};
use crate::error::{ClientError, OrchestratorError};
use crate::journal::Journal;
use crate::models::{BuildStatus, Component, PlatformConfig};

/// An open, journaled session against the external toolchain.
///
/// Explicitly threaded through every call; never a process-wide singleton,
/// so multiple sequential sessions or test doubles can coexist.
pub struct Session {
    inner: Box<dyn ToolchainSession>,
    workspace: PathBuf,
    journal: Option<Journal>,
    closed: bool,
}

impl Session {
    /// Establish a session rooted at the given workspace path.
    pub fn open(
        toolchain: &dyn Toolchain,
        workspace: &Path,
        journal: Option<Journal>,
    ) -> Result<Session, ClientError> {
        if let Some(ref journal) = journal {
            journal.record_call(format!(
                "open_session(workspace=\"{}\")",
                workspace.display()
            ));
        }
        let inner = toolchain.open(workspace)?;
        log::info!("session opened: workspace {}", workspace.display());
        Ok(Session {
            inner,
            workspace: workspace.to_path_buf(),
            journal,
            closed: false,
        })
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Register a new platform component in this workspace.
    pub fn create_platform_component(
        &mut self,
        config: &PlatformConfig,
    ) -> Result<Component, ClientError> {
        self.record(format!(
            "create_platform_component(name=\"{}\", hw_design=\"{}\", os=\"{}\", cpu=\"{}\", domain_name=\"{}\", generate_dtb={}, compiler=\"{}\")",
            config.name,
            config.hw_design,
            config.os,
            config.cpu,
            config.domain_name,
            config.generate_dtb,
            config.compiler,
        ));
        self.inner.create_platform_component(config)
    }

    /// Look up a previously created component by name.
    pub fn get_component(&mut self, name: &str) -> Result<Component, ClientError> {
        self.record(format!("get_component(name=\"{}\")", name));
        self.inner.get_component(name)
    }

    /// Build a component, blocking until the toolchain reports completion.
    /// Failure propagates as `ClientError::BuildFailure`.
    pub fn build(&mut self, component: &Component) -> Result<BuildStatus, ClientError> {
        self.record(format!("build(name=\"{}\")", component.name));
        match self.inner.build(component) {
            Ok(status) => {
                self.record(format!("# status: {}", status.diagnostics));
                Ok(status)
            }
            Err(e) => {
                self.record(format!("# status: FAILED: {}", e));
                Err(e)
            }
        }
    }

    /// Close the session, releasing toolchain-side locks and handles.
    pub fn close(mut self) -> Result<(), ClientError> {
        self.record("close_session()".to_string());
        self.closed = true;
        let result = self.inner.close();
        log::info!("session closed: workspace {}", self.workspace.display());
        result
    }

    fn record(&self, call: String) {
        if let Some(ref journal) = self.journal {
            journal.record_call(call);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            // Backstop for panics and early returns that bypassed close().
            self.record("close_session()  # implicit, session dropped".to_string());
            log::warn!(
                "session for {} dropped without explicit close; releasing",
                self.workspace.display()
            );
            let _ = self.inner.close();
        }
    }
}

/// Run `f` inside a session, closing it on every exit path.
///
/// If `f` fails, the session is still closed and `f`'s error wins; a
/// close failure after a successful `f` is reported.
pub fn with_session<T>(
    toolchain: &dyn Toolchain,
    workspace: &Path,
    journal: Option<Journal>,
    f: impl FnOnce(&mut Session) -> Result<T, OrchestratorError>,
) -> Result<T, OrchestratorError> {
    let mut session = Session::open(toolchain, workspace, journal)?;
    let result = f(&mut session);
    let close_result = session.close();
    match result {
        Ok(value) => {
            close_result?;
            Ok(value)
        }
        Err(e) => {
            if let Err(close_err) = close_result {
                log::warn!("session close failed after error: {}", close_err);
            }
            Err(e)
        }
    }
}
