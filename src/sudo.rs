//! Privilege checks and acting on behalf of the user who ran `sudo tuffix`.
//!
//! Package transactions need root, but files like `~/.gitconfig` and
//! `~/.ssh/id_rsa` must end up owned by the human user. Commands that touch
//! the user's account are therefore re-run through `sudo -u <user>`.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::process::Command;

pub trait Privilege {
    /// Whether the process may change system packages.
    fn is_elevated(&self) -> bool;
}

/// Effective uid of this process.
pub struct ProcessPrivilege;

impl Privilege for ProcessPrivilege {
    fn is_elevated(&self) -> bool {
        // SAFETY: geteuid has no preconditions and cannot fail
        unsafe { libc::geteuid() == 0 }
    }
}

/// Require root, as every package-changing command does.
pub fn require_elevated(privilege: &dyn Privilege) -> Result<()> {
    if privilege.is_elevated() {
        Ok(())
    } else {
        Err(Error::Permission)
    }
}

/// The human behind this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokingUser {
    pub name: String,
    pub home: PathBuf,
    /// Commands must drop from root to this user
    via_sudo: bool,
}

/// `SUDO_USER` wins over `USER`/`LOGNAME`; root itself is never the answer
/// when someone sudo'd into it.
fn resolve_name(sudo_user: Option<String>, user: Option<String>) -> Option<(String, bool)> {
    let non_empty = |v: &String| !v.is_empty();
    if let Some(name) = sudo_user.filter(non_empty).filter(|n| n != "root") {
        return Some((name, true));
    }
    user.filter(non_empty).map(|name| (name, false))
}

impl InvokingUser {
    pub fn detect(privilege: &dyn Privilege) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let (name, sudo) = resolve_name(env("SUDO_USER"), env("USER").or_else(|| env("LOGNAME")))
            .ok_or_else(|| Error::environment("could not determine the invoking user"))?;

        let home = hostinfo::passwd::lookup(&name)
            .map(|entry| PathBuf::from(entry.home))
            .unwrap_or_else(|e| {
                log::debug!("passwd lookup for {name} failed: {e}");
                PathBuf::from("/home").join(&name)
            });

        Ok(Self {
            via_sudo: sudo && privilege.is_elevated(),
            name,
            home,
        })
    }

    /// A command that runs `program` as this user.
    pub fn command(&self, program: &str) -> Command {
        if self.via_sudo {
            let mut command = Command::new("sudo");
            command.args(["-u", &self.name, "-H", "--", program]);
            command
        } else {
            Command::new(program)
        }
    }
}
