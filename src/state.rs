//! The JSON state file recording which keywords are installed.
//!
//! ```json
//! {"version": "0.1.0", "installed": ["base", "c121"]}
//! ```

use crate::error::{Error, Result};
use crate::registry::Registry;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Root writes the state file, any user may read it.
const STATE_FILE_MODE: u32 = 0o644;

// ============================================================================
// InstalledState
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledState {
    /// Version of tuffix that created the file
    #[serde(with = "version_string")]
    pub version: Version,

    /// Installed keyword names, in the order they were added
    pub installed: Vec<String>,
}

impl InstalledState {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            installed: Vec::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.installed.iter().any(|n| n == name)
    }

    /// Record `name` as installed. Already-present names are left in place.
    pub fn mark(&mut self, name: &str) {
        if !self.contains(name) {
            self.installed.push(name.to_string());
        }
    }

    pub fn unmark(&mut self, name: &str) {
        self.installed.retain(|n| n != name);
    }

    /// Name of the first recorded keyword the registry does not know.
    pub fn first_unknown(&self, registry: &Registry) -> Option<&str> {
        self.installed
            .iter()
            .map(String::as_str)
            .find(|name| !registry.contains(name))
    }
}

/// The version is stored as a plain string and must be valid semver.
mod version_string {
    use semver::Version;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(version: &Version, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(version)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Version, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(|e| de::Error::custom(format!("bad version {raw:?}: {e}")))
    }
}

// ============================================================================
// StateStore
// ============================================================================

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read and parse the state file.
    pub fn load(&self) -> Result<InstalledState> {
        if !self.exists() {
            return Err(Error::StateUnavailable {
                path: self.path.clone(),
            });
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::io(format!("could not read {}", self.path.display()), e)
        })?;

        let state: InstalledState =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;
        log::debug!(
            "Loaded state from {} ({} installed)",
            self.path.display(),
            state.installed.len()
        );
        Ok(state)
    }

    /// Load, then check every recorded keyword still exists.
    pub fn load_verified(&self, registry: &Registry) -> Result<InstalledState> {
        let state = self.load()?;
        if let Some(name) = state.first_unknown(registry) {
            return Err(self.corrupt(format!("unknown keyword \"{name}\" recorded as installed")));
        }
        Ok(state)
    }

    /// Replace the state file atomically: write a sibling temp file, sync it,
    /// then rename it over the target.
    pub fn save(&self, state: &InstalledState) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let context = || format!("could not write {}", self.path.display());

        let content = serde_json::to_string_pretty(state)
            .map_err(|e| Error::io(context(), std::io::Error::other(e)))?;

        let write = |tmp: &mut NamedTempFile| -> std::io::Result<()> {
            // temp files start out 0600; everyone may read the installed set
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(STATE_FILE_MODE))?;
            tmp.write_all(content.as_bytes())?;
            tmp.write_all(b"\n")?;
            tmp.as_file().sync_all()
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(context(), e))?;
        write(&mut tmp).map_err(|e| Error::io(context(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| Error::io(context(), e.error))?;

        log::debug!("Saved state to {}", self.path.display());
        Ok(())
    }

    /// Create the state file with nothing installed.
    pub fn init(&self, version: &Version) -> Result<InstalledState> {
        if self.exists() {
            return Err(Error::usage("init has already been done"));
        }
        self.create_dir()?;
        let state = InstalledState::new(version.clone());
        self.save(&state)?;
        Ok(state)
    }

    /// Create the directory holding the state file (and its lock).
    pub fn create_dir(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| Error::io(format!("could not create {}", dir.display()), e))?;
        }
        Ok(())
    }

    fn corrupt(&self, reason: String) -> Error {
        Error::StateCorrupt {
            path: self.path.clone(),
            reason,
        }
    }
}
