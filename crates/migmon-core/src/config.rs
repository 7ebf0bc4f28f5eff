//! Configuration surface shared by the CLI and the dashboard.
//!
//! Sources, lowest precedence first: an optional YAML config file
//! (`~/.gh-migration-monitor/config.yaml` unless a path is given), then
//! `GHMM_*` environment variables. Command-line flags are applied on top by
//! the CLI. Validation runs before any core component is constructed.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::MonitorError;

pub const ENV_TOKEN: &str = "GHMM_GITHUB_TOKEN";
pub const ENV_ORGANIZATION: &str = "GHMM_GITHUB_ORGANIZATION";
pub const ENV_IS_LEGACY: &str = "GHMM_ISLEGACY";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GithubSection,
    #[serde(default)]
    pub migration: MigrationSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubSection {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub organization: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MigrationSection {
    #[serde(default)]
    pub is_legacy: bool,
}

impl Config {
    /// Loads configuration from the config file (if present) and the
    /// environment. A missing file at the default location is fine; an
    /// explicitly requested file that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Config, MonitorError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Config::default(),
            },
        };

        config.apply_env();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Config, MonitorError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            MonitorError::ConfigError(format!("cannot read {}: {err}", path.display()))
        })?;
        serde_yaml::from_str(&raw).map_err(|err| {
            MonitorError::ConfigError(format!("cannot parse {}: {err}", path.display()))
        })
    }

    fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".gh-migration-monitor").join("config.yaml"))
    }

    fn apply_env(&mut self) {
        if let Ok(token) = env::var(ENV_TOKEN) {
            if !token.is_empty() {
                self.github.token = token;
            }
        }
        if let Ok(organization) = env::var(ENV_ORGANIZATION) {
            if !organization.is_empty() {
                self.github.organization = organization;
            }
        }
        if let Ok(is_legacy) = env::var(ENV_IS_LEGACY) {
            self.migration.is_legacy = is_truthy(&is_legacy);
        }
    }

    /// Checks the invariants that must hold before the monitor starts.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.github.organization.is_empty() {
            return Err(MonitorError::ConfigError(
                "github organization is required".to_string(),
            ));
        }
        if self.github.token.is_empty() {
            return Err(MonitorError::ConfigError(
                "github token is required".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        env::remove_var(ENV_TOKEN);
        env::remove_var(ENV_ORGANIZATION);
        env::remove_var(ENV_IS_LEGACY);
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn file_values_are_loaded() {
        clear_env();
        let file = write_config(
            "github:\n  token: file-token\n  organization: acme\nmigration:\n  is_legacy: true\n",
        );

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.github.token, "file-token");
        assert_eq!(config.github.organization, "acme");
        assert!(config.migration.is_legacy);
    }

    #[test]
    #[serial]
    fn env_overrides_file_values() {
        clear_env();
        let file = write_config("github:\n  token: file-token\n  organization: acme\n");
        env::set_var(ENV_TOKEN, "env-token");
        env::set_var(ENV_IS_LEGACY, "1");

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.github.token, "env-token");
        assert_eq!(config.github.organization, "acme");
        assert!(config.migration.is_legacy);
        clear_env();
    }

    #[test]
    #[serial]
    fn missing_explicit_file_is_an_error() {
        clear_env();
        let err = Config::load(Some(Path::new("/nonexistent/config.yaml"))).unwrap_err();
        assert!(matches!(err, MonitorError::ConfigError(_)));
    }

    #[test]
    #[serial]
    fn validate_requires_organization_and_token() {
        clear_env();
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.github.organization = "acme".to_string();
        assert!(config.validate().is_err());

        config.github.token = "token".to_string();
        assert!(config.validate().is_ok());
    }
}
