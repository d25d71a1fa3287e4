//! # aptkit
//!
//! Rust library for apt package transactions on Debian-derived hosts.
//!
//! This crate provides functionality for:
//! - Installing and removing groups of packages in one apt transaction
//! - Per-package reporting when apt rejects part of a request
//! - Categorizing apt failures (network, lock contention, unknown package)
//! - Retrying transient failures with exponential backoff
//!
//! ## Example
//!
//! ```no_run
//! use aptkit::{Client, Package};
//!
//! let client = Client::new().expect("apt not available");
//!
//! let packages = Package::from_names(&["build-essential", "gdb"]);
//! let report = client.install_all(&packages).expect("transaction failed");
//! for (name, reason) in report.failures() {
//!     println!("{name}: {reason}");
//! }
//! client.autoremove().expect("autoremove failed");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod retry;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{Action, Package, PackageOutcome, RetryConfig, TransactionReport};

use backend::{Backend, apt::AptBackend};

/// High-level client for apt operations.
///
/// The client wraps a backend and applies the configured retry policy to
/// every mutating call.
pub struct Client {
    backend: Box<dyn Backend>,
    retry: RetryConfig,
}

impl Client {
    /// Create a new Client with the default backend.
    ///
    /// Returns an error if apt is not installed.
    pub fn new() -> Result<Self> {
        let backend = AptBackend::new()?;
        Ok(Self {
            backend: Box::new(backend),
            retry: RetryConfig::default(),
        })
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            retry: RetryConfig::no_retry(),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Check if apt is available.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    // =========================================================================
    // Package Operations
    // =========================================================================

    /// Install packages, retrying transient failures.
    pub fn install_all(&self, packages: &[Package]) -> Result<TransactionReport> {
        log::info!("Installing {} package(s)", packages.len());
        retry::with_retry(&self.retry, retry::log_retry, || {
            self.backend.install(packages)
        })
    }

    /// Remove packages, retrying transient failures.
    pub fn remove_all(&self, packages: &[Package]) -> Result<TransactionReport> {
        log::info!("Removing {} package(s)", packages.len());
        retry::with_retry(&self.retry, retry::log_retry, || {
            self.backend.remove(packages)
        })
    }

    /// Remove orphaned automatically-installed dependencies.
    pub fn autoremove(&self) -> Result<()> {
        retry::with_retry(&self.retry, retry::log_retry, || {
            self.backend.autoremove()
        })
    }

    /// Refresh package lists.
    pub fn update(&self) -> Result<()> {
        retry::with_retry(&self.retry, retry::log_retry, || {
            self.backend.update()
        })
    }

    /// Upgrade every installed package.
    pub fn upgrade(&self) -> Result<()> {
        retry::with_retry(&self.retry, retry::log_retry, || {
            self.backend.upgrade()
        })
    }

    /// Check if a package is installed.
    pub fn is_installed(&self, package: &Package) -> Result<bool> {
        self.backend.is_installed(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fake backend that fails with a lock error a fixed number of times.
    struct FlakyBackend {
        lock_failures: AtomicU32,
        installed: Mutex<Vec<String>>,
    }

    impl Backend for FlakyBackend {
        fn is_available(&self) -> bool {
            true
        }

        fn update(&self) -> Result<()> {
            Ok(())
        }

        fn install(&self, packages: &[Package]) -> Result<TransactionReport> {
            if self.lock_failures.load(Ordering::SeqCst) > 0 {
                self.lock_failures.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::Locked {
                    message: "Could not get lock".to_string(),
                });
            }
            let mut installed = self.installed.lock().unwrap();
            installed.extend(packages.iter().map(|p| p.name.clone()));
            Ok(TransactionReport::all_done(Action::Install, packages))
        }

        fn remove(&self, packages: &[Package]) -> Result<TransactionReport> {
            let mut installed = self.installed.lock().unwrap();
            installed.retain(|n| !packages.iter().any(|p| &p.name == n));
            Ok(TransactionReport::all_done(Action::Remove, packages))
        }

        fn autoremove(&self) -> Result<()> {
            Ok(())
        }

        fn upgrade(&self) -> Result<()> {
            Ok(())
        }

        fn is_installed(&self, package: &Package) -> Result<bool> {
            Ok(self.installed.lock().unwrap().contains(&package.name))
        }
    }

    fn flaky(lock_failures: u32) -> FlakyBackend {
        FlakyBackend {
            lock_failures: AtomicU32::new(lock_failures),
            installed: Mutex::new(Vec::new()),
        }
    }

    fn fast_retry(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: std::time::Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: std::time::Duration::from_millis(5),
        }
    }

    #[test]
    fn test_install_retries_lock_contention() {
        let client = Client::with_backend(Box::new(flaky(1))).with_retry(fast_retry(3));
        let packages = Package::from_names(&["cowsay"]);

        let report = client.install_all(&packages).unwrap();
        assert!(report.is_success());
        assert!(client.is_installed(&Package::new("cowsay")).unwrap());
    }

    #[test]
    fn test_default_test_client_does_not_retry() {
        let client = Client::with_backend(Box::new(flaky(1)));
        let result = client.install_all(&Package::from_names(&["cowsay"]));
        assert!(matches!(result, Err(Error::Locked { .. })));
    }

    #[test]
    fn test_remove_all() {
        let client = Client::with_backend(Box::new(flaky(0)));
        let packages = Package::from_names(&["sox", "vlc"]);
        client.install_all(&packages).unwrap();

        let report = client.remove_all(&packages[..1]).unwrap();
        assert_eq!(report.action, Action::Remove);
        assert!(!client.is_installed(&Package::new("sox")).unwrap());
        assert!(client.is_installed(&Package::new("vlc")).unwrap());
    }
}
