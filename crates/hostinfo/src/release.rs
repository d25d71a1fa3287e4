//! Distribution release information (`/etc/lsb-release`, `/etc/os-release`).

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Path of the LSB release file.
pub const LSB_RELEASE_PATH: &str = "/etc/lsb-release";

/// Path of the os-release file.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Marker file present on every Debian derivative.
pub const DEBIAN_VERSION_PATH: &str = "/etc/debian_version";

static CODENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^DISTRIB_CODENAME=(?P<name>[a-zA-Z]+)\s*$").expect("valid regex"));

/// Parsed contents of `/etc/lsb-release`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsbRelease {
    fields: HashMap<String, String>,
}

impl LsbRelease {
    /// Read and parse `/etc/lsb-release`.
    pub fn load() -> Result<Self> {
        let path = Path::new(LSB_RELEASE_PATH);
        if !path.exists() {
            return Err(Error::Missing(path.to_path_buf()));
        }
        Ok(Self::parse(&std::fs::read_to_string(path)?))
    }

    /// Parse `KEY=value` lines, skipping comments and stripping quotes.
    pub fn parse(content: &str) -> Self {
        let fields = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), unquote(value.trim()).to_string()))
            .collect();
        Self { fields }
    }

    /// Look up a raw field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::parse(LSB_RELEASE_PATH, format!("missing {key}")))
    }

    /// `DISTRIB_ID`, e.g. "Ubuntu".
    pub fn id(&self) -> Result<&str> {
        self.require("DISTRIB_ID")
    }

    /// `DISTRIB_RELEASE`, e.g. "20.04".
    pub fn release(&self) -> Result<&str> {
        self.require("DISTRIB_RELEASE")
    }

    /// `DISTRIB_DESCRIPTION`, e.g. "Ubuntu 20.04.1 LTS".
    pub fn description(&self) -> Result<&str> {
        self.require("DISTRIB_DESCRIPTION")
    }
}

/// Extract the release codename (e.g. "focal") from lsb-release content.
///
/// The last matching line wins, as with shell sourcing.
pub fn parse_codename(content: &str) -> Result<String> {
    content
        .lines()
        .filter_map(|line| CODENAME_RE.captures(line.trim()))
        .last()
        .map(|caps| caps["name"].to_string())
        .ok_or_else(|| Error::parse(LSB_RELEASE_PATH, "could not find a distrib codename"))
}

/// Extract the `NAME` field from os-release content.
pub fn parse_os_name(content: &str) -> Result<String> {
    content
        .lines()
        .filter_map(|line| line.trim().strip_prefix("NAME="))
        .map(|value| unquote(value.trim()).to_string())
        .find(|name| !name.is_empty())
        .ok_or_else(|| Error::parse(OS_RELEASE_PATH, "no NAME field"))
}

/// Current distribution name from `/etc/os-release`.
pub fn operating_system() -> Result<String> {
    let path = Path::new(OS_RELEASE_PATH);
    if !path.exists() {
        return Err(Error::Missing(path.to_path_buf()));
    }
    parse_os_name(&std::fs::read_to_string(path)?)
}

/// Whether this host is a Debian derivative.
pub fn is_debian_derivative() -> bool {
    Path::new(DEBIAN_VERSION_PATH).exists()
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}
