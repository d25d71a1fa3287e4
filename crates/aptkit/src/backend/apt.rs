//! Real apt backend using `apt-get` and `dpkg-query` commands.

use crate::backend::Backend;
use crate::error::{self, Error, Result};
use crate::types::{Action, Package, TransactionReport};
use std::path::PathBuf;
use std::process::{Command, Output};

/// Backend that executes real `apt-get` commands.
pub struct AptBackend {
    /// Path to the apt-get executable
    apt_get: PathBuf,
    /// Path to the dpkg-query executable
    dpkg_query: PathBuf,
}

impl AptBackend {
    /// Create a new AptBackend.
    ///
    /// Returns an error if apt-get or dpkg-query is not installed.
    pub fn new() -> Result<Self> {
        let apt_get = which::which("apt-get").map_err(|_| Error::AptNotFound)?;
        let dpkg_query = which::which("dpkg-query").map_err(|_| Error::AptNotFound)?;
        log::debug!("Using {} and {}", apt_get.display(), dpkg_query.display());
        Ok(Self {
            apt_get,
            dpkg_query,
        })
    }

    /// Run an apt-get command non-interactively and return output.
    fn run_apt(&self, args: &[&str]) -> Result<Output> {
        log::debug!("apt-get {}", args.join(" "));
        let output = Command::new(&self.apt_get)
            .args(["-y", "-q"])
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .output()
            .map_err(|e| Error::CommandFailed {
                message: format!("failed to execute apt-get: {e}"),
                stderr: String::new(),
            })?;
        for line in output_lines(&output.stdout) {
            log::debug!("apt: {line}");
        }
        Ok(output)
    }

    /// Run an apt-get command and check for success.
    fn run_apt_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run_apt(args)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::from_apt_output(&stderr, None));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run an install/remove transaction and build its report.
    fn transaction(&self, action: Action, packages: &[Package]) -> Result<TransactionReport> {
        if packages.is_empty() {
            return Ok(TransactionReport::all_done(action, packages));
        }

        let mut args = vec![action.apt_command()];
        args.extend(packages.iter().map(|p| p.name.as_str()));

        let output = self.run_apt(&args)?;
        if output.status.success() {
            return Ok(TransactionReport::all_done(action, packages));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let rejected = error::missing_packages(&stderr);
        if rejected.is_empty() {
            let only = (packages.len() == 1).then(|| packages[0].name.as_str());
            Err(Error::from_apt_output(&stderr, only))
        } else {
            log::debug!("apt rejected packages: {}", rejected.join(", "));
            Ok(TransactionReport::rejected(action, packages, &rejected))
        }
    }
}

impl Backend for AptBackend {
    fn is_available(&self) -> bool {
        Command::new(&self.apt_get)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn update(&self) -> Result<()> {
        self.run_apt_checked(&["update"])?;
        Ok(())
    }

    fn install(&self, packages: &[Package]) -> Result<TransactionReport> {
        self.transaction(Action::Install, packages)
    }

    fn remove(&self, packages: &[Package]) -> Result<TransactionReport> {
        self.transaction(Action::Remove, packages)
    }

    fn autoremove(&self) -> Result<()> {
        self.run_apt_checked(&["autoremove"])?;
        Ok(())
    }

    fn upgrade(&self) -> Result<()> {
        self.run_apt_checked(&["upgrade"])?;
        Ok(())
    }

    fn is_installed(&self, package: &Package) -> Result<bool> {
        let output = Command::new(&self.dpkg_query)
            .args(["-W", "-f=${Status}", package.name.as_str()])
            .output()?;

        // dpkg-query exits non-zero for packages it has never heard of
        if !output.status.success() {
            return Ok(false);
        }

        Ok(is_installed_status(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Interpret a dpkg `${Status}` field ("want flag status").
fn is_installed_status(status: &str) -> bool {
    status.split_whitespace().last() == Some("installed")
}

/// Non-blank lines of apt's stdout, for debug logging.
fn output_lines(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
