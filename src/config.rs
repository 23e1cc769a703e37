//! Transform configuration and the environment gate.
//!
//! A [`TransformConfig`] is what callers supply (deserialized from JSON or YAML, or built in
//! code). It is resolved exactly once per run against an [`Environment`] into a
//! [`ResolvedConfig`], which every rule and the walker read by reference.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::TransformError;
use crate::err_msg;

/// Caller-supplied options. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformConfig {
    pub enabled: bool,
    /// Tag prefixed to every generated label as `[scope] `.
    pub scope: Option<String>,
    pub verbose: bool,
    /// Environment variable conditions, checked in key order.
    pub environment_requires: BTreeMap<String, EnvRequirement>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scope: None,
            verbose: false,
            environment_requires: BTreeMap::new(),
        }
    }
}

/// `true` requires the variable to be set, a string requires it to equal that value.
/// `false` imposes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvRequirement {
    Present(bool),
    Equals(String),
}

impl EnvRequirement {
    fn is_met_by(&self, value: Option<&str>) -> bool {
        match self {
            EnvRequirement::Present(true) => value.is_some(),
            EnvRequirement::Present(false) => true,
            EnvRequirement::Equals(expected) => value == Some(expected.as_str()),
        }
    }
}

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Read access to environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    /// Values that are not valid UTF-8 are still present; they are converted lossily.
    fn var(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl Environment for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Configuration after the environment gate. Immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    enabled: bool,
    scope: Option<String>,
    verbose: bool,
    disabled_by: Option<String>,
}

impl ResolvedConfig {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// The environment variable whose requirement turned macros off, if any.
    pub fn disabled_by(&self) -> Option<&str> {
        self.disabled_by.as_deref()
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        TransformConfig::default().resolve(&ProcessEnv)
    }
}

impl TransformConfig {
    /// Applies `environmentRequires`. The first unmet requirement disables macros.
    pub fn resolve<E: Environment + ?Sized>(&self, env: &E) -> ResolvedConfig {
        let mut enabled = self.enabled;
        let mut disabled_by = None;
        if enabled {
            let unmet = self
                .environment_requires
                .iter()
                .find(|(name, requirement)| !requirement.is_met_by(env.var(name).as_deref()));
            if let Some((name, _)) = unmet {
                enabled = false;
                disabled_by = Some(name.clone());
            }
        }
        ResolvedConfig {
            enabled,
            scope: self.scope.clone(),
            verbose: self.verbose,
            disabled_by,
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, TransformError> {
        serde_json::from_str(text)
            .map_err(|e| err_msg!(Config, "invalid JSON configuration: {}", e).with_cause(e))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, TransformError> {
        serde_yaml::from_str(text)
            .map_err(|e| err_msg!(Config, "invalid YAML configuration: {}", e).with_cause(e))
    }

    /// Reads a `.json`, `.yaml` or `.yml` configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TransformError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            err_msg!(Config, "failed to read {}: {}", path.display(), e).with_cause(e)
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            _ => Err(err_msg!(
                Config,
                "unsupported configuration file {}",
                path.display()
            )
            .with_help("use a .json, .yaml or .yml file")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = TransformConfig::from_json_str("{}").expect("config");
        assert_eq!(config, TransformConfig::default());
        let resolved = config.resolve(&env(&[]));
        assert!(resolved.enabled());
        assert!(!resolved.verbose());
        assert_eq!(resolved.scope(), None);
    }

    #[test]
    fn test_camel_case_keys() {
        let config = TransformConfig::from_json_str(
            r#"{ "enabled": false, "scope": "server", "verbose": true,
                 "environmentRequires": { "CI": true, "MODE": "debug", "SKIP": false } }"#,
        )
        .expect("config");
        assert!(!config.enabled);
        assert_eq!(config.scope.as_deref(), Some("server"));
        assert_eq!(
            config.environment_requires.get("MODE"),
            Some(&EnvRequirement::Equals("debug".to_string()))
        );
        assert_eq!(
            config.environment_requires.get("SKIP"),
            Some(&EnvRequirement::Present(false))
        );
    }

    #[test]
    fn test_required_variable_missing_disables() {
        let config = TransformConfig::from_yaml_str("environmentRequires:\n  FOO: true\n")
            .expect("config");
        let resolved = config.resolve(&env(&[]));
        assert!(!resolved.enabled());
        assert_eq!(resolved.disabled_by(), Some("FOO"));
        assert!(config.resolve(&env(&[("FOO", "")])).enabled());
    }

    #[test]
    fn test_required_value_must_match() {
        let config = TransformConfig::from_yaml_str("environmentRequires:\n  MODE: debug\n")
            .expect("config");
        assert!(config.resolve(&env(&[("MODE", "debug")])).enabled());
        assert!(!config.resolve(&env(&[("MODE", "release")])).enabled());
        assert!(!config.resolve(&env(&[])).enabled());
    }

    #[test]
    fn test_false_requirement_imposes_nothing() {
        let config = TransformConfig::from_json_str(r#"{ "environmentRequires": { "X": false } }"#)
            .expect("config");
        assert!(config.resolve(&env(&[])).enabled());
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let err = TransformConfig::from_json_str(r#"{ "enabled": "yes" }"#).unwrap_err();
        assert_eq!(err.kind(), crate::diagnostics::ErrorKind::Config);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_process_variable_counts_as_present() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let name = "DEBUG_TRANSFORM_TEST_NON_UTF8";
        std::env::set_var(name, OsStr::from_bytes(&[b'o', b'n', 0xff]));
        let config = TransformConfig::from_json_str(
            r#"{ "environmentRequires": { "DEBUG_TRANSFORM_TEST_NON_UTF8": true } }"#,
        )
        .expect("config");
        let resolved = config.resolve(&ProcessEnv);
        std::env::remove_var(name);
        assert!(resolved.enabled());
    }
}
