//! Bench configuration for rehearsal runs.
//!
//! The scripted sessions this tool replaces hard-coded their workspace path
//! and component parameters in source. Here they live in a JSON bench config;
//! the built-in default reproduces the observed scenario (workspace
//! `vitiswork`, platform `ARTY`, application `app_component`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{AdvancedOptions, Compiler, HwDesignRef, OsTarget, PlatformConfig};
use crate::workflow::{Workflow, WorkflowStep};

/// JSON-backed configuration for one rehearsal run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub workspace_path: String,
    pub platform: PlatformConfig,
    pub application: Option<String>,
    pub steps: Vec<WorkflowStep>,
    /// Application components assumed to have been created outside these
    /// workflows (in the IDE). The rehearsal backend seeds them before the
    /// run so retrieval by name behaves like the persisted registry.
    pub preexisting_applications: Vec<String>,
    /// Directory for session journals.
    pub journal_dir: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            workspace_path: "vitiswork".to_string(),
            platform: PlatformConfig {
                name: "ARTY".to_string(),
                hw_design: HwDesignRef::new("$COMPONENT_LOCATION/../hw/artyz7_20_platform.xsa"),
                os: OsTarget::Standalone,
                cpu: "ps7_cortexa9_0".to_string(),
                domain_name: "standalone_ps7_cortexa9_0".to_string(),
                generate_dtb: false,
                compiler: Compiler::Gcc,
                advanced: AdvancedOptions::default(),
            },
            application: Some("app_component".to_string()),
            steps: vec![
                WorkflowStep::EnsurePlatform,
                WorkflowStep::BuildPlatform,
                WorkflowStep::BuildApplication,
                WorkflowStep::RefreshPlatform,
            ],
            preexisting_applications: vec!["app_component".to_string()],
            journal_dir: "logs".to_string(),
        }
    }
}

impl BenchConfig {
    /// Load a bench config from a JSON file.
    pub fn load(path: &Path) -> Result<BenchConfig, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string())
            } else {
                ConfigError::IoError(e)
            }
        })?;
        let config: BenchConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Persist the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Workspace path as a `PathBuf`.
    pub fn workspace(&self) -> PathBuf {
        PathBuf::from(&self.workspace_path)
    }

    /// Turn the config into a runnable workflow. Validation happens when the
    /// orchestrator takes the workflow.
    pub fn to_workflow(&self) -> Workflow {
        Workflow {
            workspace: self.workspace(),
            platform: self.platform.clone(),
            application: self.application.clone(),
            steps: self.steps.clone(),
        }
    }
}
