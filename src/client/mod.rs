//! External toolchain boundary.
//!
//! The vendor build client is an opaque collaborator: it owns the workspace
//! store, component definitions, and every build artifact. This module pins
//! that boundary down to two traits so the orchestrator can be driven against
//! the real client, the in-memory simulation, or a scripted test double.

pub mod memory;

use std::path::Path;

use crate::error::ClientError;
use crate::models::{BuildStatus, Component, PlatformConfig};

/// Factory for workspace-scoped sessions against the external toolchain.
///
/// Implementations must allow multiple handles to coexist; nothing here is a
/// process-wide singleton.
pub trait Toolchain {
    /// Open a session rooted at the given workspace directory.
    ///
    /// # Errors
    /// `ClientError::Environment` if the path is unusable or the toolchain
    /// itself is unavailable.
    fn open(&self, workspace: &Path) -> Result<Box<dyn ToolchainSession>, ClientError>;
}

/// One open session against the toolchain.
///
/// All calls are blocking and strictly sequential; the session assumes
/// exclusive ownership of the workspace until [`close`](Self::close). The
/// component store behind the session persists across sessions, keyed by
/// workspace path and component name.
pub trait ToolchainSession: std::fmt::Debug {
    /// Register a new platform component described by a hardware design
    /// artifact plus target configuration.
    ///
    /// # Errors
    /// `DuplicateName` if the name already exists in this workspace,
    /// `InvalidReference` if the hardware design artifact cannot be located.
    fn create_platform_component(
        &mut self,
        config: &PlatformConfig,
    ) -> Result<Component, ClientError>;

    /// Look up a previously created component by name.
    ///
    /// # Errors
    /// `NotFound` if no component with this name exists in the workspace.
    fn get_component(&mut self, name: &str) -> Result<Component, ClientError>;

    /// Trigger a build and block until the toolchain reports completion.
    ///
    /// A toolchain-reported failure surfaces as `ClientError::BuildFailure`,
    /// never as an ignorable status value.
    fn build(&mut self, component: &Component) -> Result<BuildStatus, ClientError>;

    /// Release all session-scoped resources (toolchain-side locks/handles).
    /// Idempotent: a second call is a no-op.
    fn close(&mut self) -> Result<(), ClientError>;
}
