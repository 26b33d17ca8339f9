//! Registry configuration
//!
//! Loaded from TOML or from `AFTERTEST_*` environment variables. Every field
//! has a default, so an empty document is a valid configuration.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CleanupError, CleanupResult};

/// Environment variable selecting the residue policy
pub const ENV_RESIDUE_POLICY: &str = "AFTERTEST_RESIDUE_POLICY";
/// Environment variable toggling panic capture
pub const ENV_CATCH_PANICS: &str = "AFTERTEST_CATCH_PANICS";

/// What happens to pending actions when a drain pass fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResiduePolicy {
    /// Leave pending actions in place; the next drain runs them again
    #[default]
    Retain,
    /// Empty the registry after every drain, successful or not
    Clear,
}

impl ResiduePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResiduePolicy::Retain => "retain",
            ResiduePolicy::Clear => "clear",
        }
    }
}

impl fmt::Display for ResiduePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResiduePolicy {
    type Err = CleanupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(ResiduePolicy::Retain),
            "clear" => Ok(ResiduePolicy::Clear),
            other => Err(CleanupError::config(format!(
                "Invalid residue policy '{}', expected 'retain' or 'clear'",
                other
            ))),
        }
    }
}

/// Cleanup registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Policy applied to pending actions after a failed drain
    pub residue_policy: ResiduePolicy,
    /// Report a panicking action as an action failure instead of unwinding
    pub catch_panics: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            residue_policy: ResiduePolicy::Retain,
            catch_panics: true,
        }
    }
}

impl CleanupConfig {
    pub fn with_residue_policy(mut self, policy: ResiduePolicy) -> Self {
        self.residue_policy = policy;
        self
    }

    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> CleanupResult<Self> {
        toml::from_str(content)
            .map_err(|e| CleanupError::config(format!("Failed to parse config: {}", e)))
    }

    /// Load a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> CleanupResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CleanupError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from the process environment, falling back to defaults
    pub fn from_env() -> CleanupResult<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Load using a custom variable lookup
    pub fn from_env_with<F>(lookup: F) -> CleanupResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(policy) = lookup(ENV_RESIDUE_POLICY) {
            config.residue_policy = policy.parse()?;
        }

        if let Some(catch_panics) = lookup(ENV_CATCH_PANICS) {
            config.catch_panics = catch_panics.trim().parse().map_err(|_| {
                CleanupError::config(format!(
                    "Invalid {} value '{}'",
                    ENV_CATCH_PANICS, catch_panics
                ))
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = CleanupConfig::default();
        assert_eq!(config.residue_policy, ResiduePolicy::Retain);
        assert!(config.catch_panics);
    }

    #[test]
    fn test_residue_policy_parse() {
        assert_eq!("retain".parse::<ResiduePolicy>().unwrap(), ResiduePolicy::Retain);
        assert_eq!(" Clear ".parse::<ResiduePolicy>().unwrap(), ResiduePolicy::Clear);
        assert!("sometimes".parse::<ResiduePolicy>().is_err());
        assert_eq!(ResiduePolicy::Clear.to_string(), "clear");
    }

    #[test]
    fn test_from_toml_str() {
        let config = CleanupConfig::from_toml_str(
            r#"
            residue_policy = "clear"
            catch_panics = false
            "#,
        )
        .unwrap();

        assert_eq!(config.residue_policy, ResiduePolicy::Clear);
        assert!(!config.catch_panics);
    }

    #[test]
    fn test_from_toml_str_empty_uses_defaults() {
        let config = CleanupConfig::from_toml_str("").unwrap();
        assert_eq!(config, CleanupConfig::default());
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let err = CleanupConfig::from_toml_str("residue_policy = \"later\"").unwrap_err();
        assert_eq!(err.error_code(), "AFTERTEST_CONFIG");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "residue_policy = \"clear\"").unwrap();

        let config = CleanupConfig::from_file(file.path()).unwrap();
        assert_eq!(config.residue_policy, ResiduePolicy::Clear);
        assert!(config.catch_panics);
    }

    #[test]
    fn test_from_file_missing() {
        let err = CleanupConfig::from_file("/nonexistent/aftertest.toml").unwrap_err();
        assert!(err.message().starts_with("Failed to read"));
    }

    #[test]
    fn test_from_env_with() {
        let vars = env(&[(ENV_RESIDUE_POLICY, "clear"), (ENV_CATCH_PANICS, "false")]);
        let config = CleanupConfig::from_env_with(|key| vars.get(key).cloned()).unwrap();

        assert_eq!(config.residue_policy, ResiduePolicy::Clear);
        assert!(!config.catch_panics);
    }

    #[test]
    fn test_from_env_with_nothing_set() {
        let config = CleanupConfig::from_env_with(|_| None).unwrap();
        assert_eq!(config, CleanupConfig::default());
    }

    #[test]
    fn test_from_env_with_invalid_bool() {
        let vars = env(&[(ENV_CATCH_PANICS, "maybe")]);
        let err = CleanupConfig::from_env_with(|key| vars.get(key).cloned()).unwrap_err();
        assert!(err.message().contains(ENV_CATCH_PANICS));
    }

    #[test]
    fn test_builder_methods() {
        let config = CleanupConfig::default()
            .with_residue_policy(ResiduePolicy::Clear)
            .with_catch_panics(false);
        assert_eq!(config.residue_policy, ResiduePolicy::Clear);
        assert!(!config.catch_panics);
    }
}
