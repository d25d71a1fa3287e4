//! Backend abstraction for apt operations.
//!
//! The [`Backend`] trait defines the interface for interacting with the
//! host package manager, allowing for different implementations (real
//! `apt-get`, in-memory fakes for testing).

pub mod apt;

use crate::error::Result;
use crate::types::{Package, TransactionReport};

/// Backend trait for package-manager operations.
///
/// `install` and `remove` return `Ok` with a per-package report when apt
/// rejected specific packages, and `Err` when the transaction as a whole
/// could not run (network, lock contention, permissions).
pub trait Backend: Send + Sync {
    /// Check if the package manager is available.
    fn is_available(&self) -> bool;

    /// Refresh package lists (`apt-get update`).
    fn update(&self) -> Result<()>;

    /// Install packages in a single transaction.
    fn install(&self, packages: &[Package]) -> Result<TransactionReport>;

    /// Remove packages in a single transaction.
    fn remove(&self, packages: &[Package]) -> Result<TransactionReport>;

    /// Remove orphaned automatically-installed dependencies.
    fn autoremove(&self) -> Result<()>;

    /// Upgrade every installed package.
    fn upgrade(&self) -> Result<()>;

    /// Check if a package is installed.
    fn is_installed(&self, package: &Package) -> Result<bool>;
}

/// Get the default backend (real apt-get CLI).
pub fn default_backend() -> Result<apt::AptBackend> {
    apt::AptBackend::new()
}
