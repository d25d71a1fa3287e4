//! Core types for apt package transactions.

use std::fmt;
use std::time::Duration;

/// A Debian package identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Package {
    /// Package name (e.g., "build-essential", "libc++-dev")
    pub name: String,
}

impl Package {
    /// Create a new package with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Build a package list from plain names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Vec<Self> {
        names.iter().map(|n| Self::new(n.as_ref())).collect()
    }

    /// Check a name against Debian policy: at least two characters,
    /// lowercase alphanumerics plus `+`, `-` and `.`, starting with an
    /// alphanumeric.
    pub fn is_valid_name(name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        name.len() >= 2
            && (first.is_ascii_lowercase() || first.is_ascii_digit())
            && chars.all(|c| {
                c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.')
            })
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Direction of a package transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `apt-get install`
    Install,
    /// `apt-get remove`
    Remove,
}

impl Action {
    /// The apt-get subcommand for this action.
    pub fn apt_command(&self) -> &'static str {
        match self {
            Action::Install => "install",
            Action::Remove => "remove",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.apt_command())
    }
}

/// What happened to one package in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    /// The package reached the requested state
    Done,
    /// The package itself was rejected (e.g. unknown to apt)
    Failed {
        /// Why apt rejected the package
        reason: String,
    },
    /// The transaction was aborted because of another package
    Skipped,
}

/// Per-package result of a single apt transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReport {
    /// Direction of the transaction
    pub action: Action,
    /// Outcome for each requested package, in request order
    pub outcomes: Vec<(String, PackageOutcome)>,
}

impl TransactionReport {
    /// A report where every package succeeded.
    pub fn all_done(action: Action, packages: &[Package]) -> Self {
        Self {
            action,
            outcomes: packages
                .iter()
                .map(|p| (p.name.clone(), PackageOutcome::Done))
                .collect(),
        }
    }

    /// A report where `rejected` packages failed and everything else was
    /// skipped because apt aborted the whole transaction.
    pub fn rejected(action: Action, packages: &[Package], rejected: &[String]) -> Self {
        Self {
            action,
            outcomes: packages
                .iter()
                .map(|p| {
                    let outcome = if rejected.contains(&p.name) {
                        PackageOutcome::Failed {
                            reason: format!("deb package \"{}\" not found, is this Ubuntu?", p.name),
                        }
                    } else {
                        PackageOutcome::Skipped
                    };
                    (p.name.clone(), outcome)
                })
                .collect(),
        }
    }

    /// Check if every package reached the requested state.
    pub fn is_success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, outcome)| *outcome == PackageOutcome::Done)
    }

    /// Packages that were rejected, with the reason.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(name, outcome)| match outcome {
                PackageOutcome::Failed { reason } => Some((name.as_str(), reason.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Total number of packages in the transaction.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Configuration for retry logic.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            max_delay: Duration::from_secs(120),
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}
