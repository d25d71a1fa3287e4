//! `/etc/passwd` lookup.

use crate::error::{Error, Result};
use std::path::Path;

/// Path of the account database.
pub const PASSWD_PATH: &str = "/etc/passwd";

/// One account from `/etc/passwd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswdEntry {
    /// Login name
    pub name: String,
    /// User id
    pub uid: u32,
    /// Primary group id
    pub gid: u32,
    /// Home directory
    pub home: String,
    /// Login shell
    pub shell: String,
}

impl PasswdEntry {
    /// Parse a single `name:x:uid:gid:gecos:home:shell` line.
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim_end().split(':').collect();
        if fields.len() != 7 || fields[0].is_empty() {
            return None;
        }
        Some(Self {
            name: fields[0].to_string(),
            uid: fields[2].parse().ok()?,
            gid: fields[3].parse().ok()?,
            home: fields[5].to_string(),
            shell: fields[6].to_string(),
        })
    }

    /// Basename of the login shell (`/usr/bin/zsh` -> `zsh`).
    pub fn shell_name(&self) -> &str {
        self.shell.rsplit('/').next().unwrap_or(&self.shell)
    }
}

/// Find `user` in passwd content. Comments and malformed lines are skipped.
pub fn find(content: &str, user: &str) -> Option<PasswdEntry> {
    content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(PasswdEntry::parse_line)
        .find(|entry| entry.name == user)
}

/// Look up `user` in `/etc/passwd`.
pub fn lookup(user: &str) -> Result<PasswdEntry> {
    let path = Path::new(PASSWD_PATH);
    if !path.exists() {
        return Err(Error::Missing(path.to_path_buf()));
    }
    find(&std::fs::read_to_string(path)?, user)
        .ok_or_else(|| Error::parse(PASSWD_PATH, format!("no entry for {user}")))
}
