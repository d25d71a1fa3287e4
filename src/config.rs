//! Process-wide configuration, built once in `main` and passed by reference.
//!
//! Layers, later wins:
//! 1. Built-in defaults
//! 2. TOML file (`/etc/tuffix/config.toml`, or `$TUFFIX_CONFIG`)
//! 3. Environment (`TUFFIX_STATE_PATH`)
//! 4. Command-line flags

use crate::error::{Error, Result};
use aptkit::RetryConfig;
use semver::Version;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_STATE_PATH: &str = "/var/lib/tuffix/state.json";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/tuffix/config.toml";
pub const CONFIG_ENV: &str = "TUFFIX_CONFIG";
pub const STATE_PATH_ENV: &str = "TUFFIX_STATE_PATH";

/// Version recorded in freshly initialized state files.
pub fn tool_version() -> Version {
    Version::parse(VERSION).unwrap_or_else(|_| Version::new(0, 1, 0))
}

/// Name and email written to the invoking user's git configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub version: Version,
    pub state_path: PathBuf,
    pub retry: RetryConfig,
    pub git: Option<GitIdentity>,
    /// `user@host` that freshly generated ssh keys are copied to
    pub key_server: Option<String>,
    pub assume_yes: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            version: tool_version(),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            // apt failures surface immediately unless retries are configured
            retry: RetryConfig::no_retry(),
            git: None,
            key_server: None,
            assume_yes: false,
        }
    }
}

// ============================================================================
// Config File
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    state_path: Option<String>,
    assume_yes: Option<bool>,
    key_server: Option<String>,
    #[serde(default)]
    apt: AptSection,
    #[serde(default)]
    git: GitSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AptSection {
    retries: Option<u32>,
    retry_delay_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GitSection {
    name: Option<String>,
    email: Option<String>,
}

impl ConfigFile {
    fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            Error::environment(format!("invalid configuration {}: {e}", path.display()))
        })
    }

    fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            log::debug!("No config file at {}", path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("could not read {}", path.display()), e))?;
        Self::parse(&content, path).map(Some)
    }
}

// ============================================================================
// BuildConfig Implementation
// ============================================================================

impl BuildConfig {
    /// Build the configuration from the file, environment and flags.
    pub fn load(assume_yes: bool) -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = Self::default();
        if let Some(file) = ConfigFile::read(&path)? {
            log::debug!("Loaded config from {}", path.display());
            config.apply_file(file);
        }
        config.apply_env(|key| std::env::var(key).ok());
        config.assume_yes |= assume_yes;
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(path) = file.state_path {
            self.state_path = expand(&path);
        }
        if let Some(yes) = file.assume_yes {
            self.assume_yes = yes;
        }
        if file.key_server.is_some() {
            self.key_server = file.key_server;
        }

        if let Some(retries) = file.apt.retries {
            // retries counts re-attempts, not the first try
            self.retry.max_attempts = retries.saturating_add(1);
            self.retry.base_delay = Duration::from_secs(file.apt.retry_delay_secs.unwrap_or(5));
        }

        self.git = match (file.git.name, file.git.email) {
            (Some(name), Some(email)) => Some(GitIdentity { name, email }),
            (None, None) => None,
            _ => {
                log::warn!("git configuration needs both name and email, ignoring it");
                None
            }
        };
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(STATE_PATH_ENV).filter(|p| !p.is_empty()) {
            self.state_path = expand(&path);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.state_path.extension().and_then(|e| e.to_str()) != Some("json") {
            return Err(Error::environment(format!(
                "state path {} must be a .json file",
                self.state_path.display()
            )));
        }
        Ok(())
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(content: &str) -> BuildConfig {
        let mut config = BuildConfig::default();
        let file = ConfigFile::parse(content, Path::new("test.toml")).unwrap();
        config.apply_file(file);
        config
    }

    #[test]
    fn test_defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.state_path, PathBuf::from(DEFAULT_STATE_PATH));
        assert_eq!(config.version, tool_version());
        assert_eq!(config.retry.max_attempts, 1);
        assert!(config.git.is_none());
        assert!(!config.assume_yes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_layer() {
        let config = from_toml(
            r#"
state_path = "/srv/tuffix/state.json"
assume_yes = true
key_server = "student@titan.fullerton.edu"

[apt]
retries = 2
retry_delay_secs = 1

[git]
name = "Tuffy Titan"
email = "tuffy@csu.fullerton.edu"
"#,
        );
        assert_eq!(config.state_path, PathBuf::from("/srv/tuffix/state.json"));
        assert!(config.assume_yes);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_secs(1));
        assert_eq!(
            config.git,
            Some(GitIdentity {
                name: "Tuffy Titan".to_string(),
                email: "tuffy@csu.fullerton.edu".to_string(),
            })
        );
        assert_eq!(
            config.key_server.as_deref(),
            Some("student@titan.fullerton.edu")
        );
    }

    #[test]
    fn test_huge_retry_count_saturates() {
        let config = from_toml("[apt]\nretries = 4294967295\n");
        assert_eq!(config.retry.max_attempts, u32::MAX);
    }

    #[test]
    fn test_partial_git_identity_ignored() {
        let config = from_toml("[git]\nname = \"Tuffy\"\n");
        assert!(config.git.is_none());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(ConfigFile::parse("colour = \"orange\"\n", Path::new("t.toml")).is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = from_toml("state_path = \"/srv/a.json\"\n");
        config.apply_env(|key| (key == STATE_PATH_ENV).then(|| "/tmp/b.json".to_string()));
        assert_eq!(config.state_path, PathBuf::from("/tmp/b.json"));
    }

    #[test]
    fn test_state_path_must_be_json() {
        let mut config = BuildConfig::default();
        config.apply_env(|_| Some("/tmp/state.toml".to_string()));
        assert!(config.validate().is_err());
    }
}
