//! Core data types for Forgebench.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigError;

/// Substitution variable the toolchain expands to the component's own
/// directory inside the workspace.
pub const COMPONENT_LOCATION_VAR: &str = "$COMPONENT_LOCATION";

/// Component names as accepted by the toolchain registry: alphanumeric with
/// hyphens, underscores, and dots. No spaces, no path separators.
static COMPONENT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-]*$").expect("valid name regex"));

/// Validate a component or domain name against the registry naming rules.
pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    if COMPONENT_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed(format!(
            "Invalid component name '{}': only alphanumeric, '.', '_' and '-' are allowed",
            name
        )))
    }
}

/// Kind of component held in the workspace registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Hardware/software target description built from a hardware design
    /// artifact plus OS/CPU/compiler settings.
    Platform,
    /// Software build artifact that targets a platform component.
    Application,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Platform => "platform",
            ComponentKind::Application => "application",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a component resolved within an open session.
///
/// The component definition itself lives in the external toolchain's
/// workspace store; this handle only carries identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub kind: ComponentKind,
}

impl Component {
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Component {
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

/// Operating system target for a platform domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsTarget {
    Standalone,
    Linux,
    FreeRtos,
}

impl fmt::Display for OsTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsTarget::Standalone => write!(f, "standalone"),
            OsTarget::Linux => write!(f, "linux"),
            OsTarget::FreeRtos => write!(f, "freertos"),
        }
    }
}

impl FromStr for OsTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standalone" => Ok(OsTarget::Standalone),
            "linux" => Ok(OsTarget::Linux),
            "freertos" => Ok(OsTarget::FreeRtos),
            _ => Err(ConfigError::ValidationFailed(format!(
                "Unknown OS target: {}",
                s
            ))),
        }
    }
}

/// Compiler selection passed through to the toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compiler {
    Gcc,
    Clang,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::Gcc
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compiler::Gcc => write!(f, "gcc"),
            Compiler::Clang => write!(f, "clang"),
        }
    }
}

impl FromStr for Compiler {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gcc" => Ok(Compiler::Gcc),
            "clang" => Ok(Compiler::Clang),
            _ => Err(ConfigError::ValidationFailed(format!(
                "Unknown compiler: {}",
                s
            ))),
        }
    }
}

/// Advanced platform options with an enumerated set of recognized keys.
///
/// The vendor client takes these as an open-ended keyword dictionary of
/// string values; here every recognized option is an explicit field and
/// unknown keys are rejected at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedOptions {
    /// Emit the platform with device-tree-overlay support.
    pub dt_overlay: bool,
}

impl AdvancedOptions {
    /// Build from string key/value pairs as the vendor dictionary carries
    /// them, e.g. `("dt_overlay", "0")`. Unknown keys and values other than
    /// `"0"`/`"1"` (or `"false"`/`"true"`) are errors.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut options = AdvancedOptions::default();
        for (key, value) in pairs {
            match key {
                "dt_overlay" => options.dt_overlay = parse_flag(key, value)?,
                _ => return Err(ConfigError::UnknownOption(key.to_string())),
            }
        }
        Ok(options)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "0" | "false" => Ok(false),
        "1" | "true" => Ok(true),
        _ => Err(ConfigError::InvalidOptionValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Reference to an exported hardware design artifact.
///
/// May contain the `$COMPONENT_LOCATION` substitution variable, which the
/// toolchain resolves against the component's directory at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HwDesignRef {
    raw: String,
}

impl HwDesignRef {
    pub fn new(raw: impl Into<String>) -> Self {
        HwDesignRef { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// Whether the reference uses the component-location variable.
    pub fn is_templated(&self) -> bool {
        self.raw.contains(COMPONENT_LOCATION_VAR)
    }

    /// Expand `$COMPONENT_LOCATION` against the component's directory.
    /// Plain paths pass through unchanged.
    pub fn resolve(&self, component_location: &Path) -> PathBuf {
        if self.is_templated() {
            let expanded = self
                .raw
                .replace(COMPONENT_LOCATION_VAR, &component_location.to_string_lossy());
            PathBuf::from(expanded)
        } else {
            PathBuf::from(&self.raw)
        }
    }
}

impl fmt::Display for HwDesignRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Full description of a platform component to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub name: String,
    pub hw_design: HwDesignRef,
    pub os: OsTarget,
    pub cpu: String,
    pub domain_name: String,
    #[serde(default)]
    pub generate_dtb: bool,
    #[serde(default)]
    pub compiler: Compiler,
    #[serde(default)]
    pub advanced: AdvancedOptions,
}

impl PlatformConfig {
    /// Check the configuration before handing it to the toolchain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name(&self.name)?;
        validate_name(&self.domain_name)?;
        if self.hw_design.is_empty() {
            return Err(ConfigError::ValidationFailed(format!(
                "Platform '{}' has no hardware design reference",
                self.name
            )));
        }
        if self.cpu.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(format!(
                "Platform '{}' has no CPU target",
                self.name
            )));
        }
        Ok(())
    }
}

/// Outcome of a single toolchain build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    Success,
    Failed,
}

/// Status returned by the toolchain when a build finishes.
///
/// A failed status never travels as a bare value through the orchestrator;
/// the boundary converts it into `ClientError::BuildFailure` so the caller
/// must handle it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildStatus {
    pub outcome: BuildOutcome,
    /// Diagnostic text reported by the toolchain (truncated build log tail).
    pub diagnostics: String,
}

impl BuildStatus {
    pub fn success(diagnostics: impl Into<String>) -> Self {
        BuildStatus {
            outcome: BuildOutcome::Success,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn failed(diagnostics: impl Into<String>) -> Self {
        BuildStatus {
            outcome: BuildOutcome::Failed,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn ok(&self) -> bool {
        self.outcome == BuildOutcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_validate_name_accepts_observed_names() {
        assert!(validate_name("ARTY").is_ok());
        assert!(validate_name("app_component").is_ok());
        assert!(validate_name("standalone_ps7_cortexa9_0").is_ok());
    }

    #[test]
    fn test_validate_name_rejects_path_like_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("a b").is_err());
        assert!(validate_name("dir/name").is_err());
        assert!(validate_name(".hidden").is_err());
    }

    #[test]
    fn test_os_target_round_trip() {
        assert_eq!("standalone".parse::<OsTarget>().unwrap(), OsTarget::Standalone);
        assert_eq!(OsTarget::Standalone.to_string(), "standalone");
        assert!("vxworks".parse::<OsTarget>().is_err());
    }

    #[test]
    fn test_advanced_options_from_pairs() {
        let opts = AdvancedOptions::from_pairs([("dt_overlay", "0")]).unwrap();
        assert!(!opts.dt_overlay);

        let opts = AdvancedOptions::from_pairs([("dt_overlay", "1")]).unwrap();
        assert!(opts.dt_overlay);
    }

    #[test]
    fn test_advanced_options_rejects_unknown_key() {
        let err = AdvancedOptions::from_pairs([("dt_overlays", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOption(_)));
    }

    #[test]
    fn test_advanced_options_rejects_bad_value() {
        let err = AdvancedOptions::from_pairs([("dt_overlay", "yes")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOptionValue { .. }));
    }

    #[test]
    fn test_hw_design_ref_expansion() {
        let design = HwDesignRef::new("$COMPONENT_LOCATION/../hw/artyz7_20_platform.xsa");
        assert!(design.is_templated());
        let resolved = design.resolve(Path::new("vitiswork/ARTY"));
        assert_eq!(
            resolved,
            PathBuf::from("vitiswork/ARTY/../hw/artyz7_20_platform.xsa")
        );
    }

    #[test]
    fn test_hw_design_ref_plain_path_passes_through() {
        let design = HwDesignRef::new("/exports/artyz7_20_platform.xsa");
        assert!(!design.is_templated());
        assert_eq!(
            design.resolve(Path::new("vitiswork/ARTY")),
            PathBuf::from("/exports/artyz7_20_platform.xsa")
        );
    }

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
    fn test_platform_config_validates() {
        assert!(arty_config().validate().is_ok());
    }

    #[test]
    fn test_platform_config_rejects_empty_hw_design() {
        let mut config = arty_config();
        config.hw_design = HwDesignRef::new("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_platform_config_rejects_empty_cpu() {
        let mut config = arty_config();
        config.cpu = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_status_outcome() {
        assert!(BuildStatus::success("done").ok());
        assert!(!BuildStatus::failed("boom").ok());
    }

    proptest! {
        // Flag parsing accepts exactly the vendor's "0"/"1" plus the
        // serde-style spellings, and nothing else.
        #[test]
        fn prop_flag_values(value in "[a-z0-9]{0,4}") {
            let result = AdvancedOptions::from_pairs([("dt_overlay", value.as_str())]);
            let expected_ok = matches!(value.as_str(), "0" | "1" | "true" | "false");
            prop_assert_eq!(result.is_ok(), expected_ok);
        }

        #[test]
        fn prop_valid_names_accepted(name in "[A-Za-z0-9][A-Za-z0-9._-]{0,16}") {
            prop_assert!(validate_name(&name).is_ok());
        }
    }
}
