//! Test doubles shared by the unit tests.

use crate::progress::ProgressCallback;
use crate::registry::Operation;
use crate::sudo::Privilege;
use aptkit::backend::Backend;
use aptkit::{Action, Client, Error, Package, Result, TransactionReport};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockState {
    calls: Vec<String>,
    installed: Vec<String>,
    /// Transactions touching this package fail outright
    fail_on: Option<String>,
    /// apt reports this package as unknown
    reject: Option<String>,
    autoremove_fails: bool,
}

/// In-memory apt. Clones share state, so a test keeps one handle while the
/// client owns another.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn failing_on(package: &str) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().fail_on = Some(package.to_string());
        backend
    }

    pub fn rejecting(package: &str) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().reject = Some(package.to_string());
        backend
    }

    pub fn with_failing_autoremove(self) -> Self {
        self.state.lock().unwrap().autoremove_fails = true;
        self
    }

    pub fn client(&self) -> Client {
        Client::with_backend(Box::new(self.clone()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn installed(&self) -> Vec<String> {
        self.state.lock().unwrap().installed.clone()
    }

    fn transaction(&self, action: Action, packages: &[Package]) -> Result<TransactionReport> {
        let mut state = self.state.lock().unwrap();
        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        state.calls.push(format!("{action} {}", names.join(" ")));

        if let Some(bad) = &state.fail_on
            && names.contains(&bad.as_str())
        {
            return Err(Error::CommandFailed {
                message: format!("apt-get failed for {bad}"),
                stderr: "E: Sub-process /usr/bin/dpkg returned an error code (1)".into(),
            });
        }
        if let Some(bad) = &state.reject
            && names.contains(&bad.as_str())
        {
            return Ok(TransactionReport::rejected(
                action,
                packages,
                std::slice::from_ref(bad),
            ));
        }

        for name in names {
            match action {
                Action::Install => state.installed.push(name.to_string()),
                Action::Remove => state.installed.retain(|n| n != name),
            }
        }
        Ok(TransactionReport::all_done(action, packages))
    }
}

impl Backend for MockBackend {
    fn is_available(&self) -> bool {
        true
    }

    fn update(&self) -> Result<()> {
        self.state.lock().unwrap().calls.push("update".into());
        Ok(())
    }

    fn install(&self, packages: &[Package]) -> Result<TransactionReport> {
        self.transaction(Action::Install, packages)
    }

    fn remove(&self, packages: &[Package]) -> Result<TransactionReport> {
        self.transaction(Action::Remove, packages)
    }

    fn autoremove(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("autoremove".into());
        if state.autoremove_fails {
            return Err(Error::Locked {
                message: "Could not get lock /var/lib/dpkg/lock-frontend".into(),
            });
        }
        Ok(())
    }

    fn upgrade(&self) -> Result<()> {
        self.state.lock().unwrap().calls.push("upgrade".into());
        Ok(())
    }

    fn is_installed(&self, package: &Package) -> Result<bool> {
        Ok(self.state.lock().unwrap().installed.contains(&package.name))
    }
}

/// Fixed answer to "are we root?".
pub struct FixedPrivilege(pub bool);

impl Privilege for FixedPrivilege {
    fn is_elevated(&self) -> bool {
        self.0
    }
}

/// Records every progress callback as "<event> <keyword>".
#[derive(Default)]
pub struct RecordingProgress {
    pub events: Vec<String>,
}

impl ProgressCallback for RecordingProgress {
    fn on_keyword_start(&mut self, _op: Operation, name: &str) {
        self.events.push(format!("start {name}"));
    }

    fn on_keyword_complete(&mut self, _op: Operation, name: &str) {
        self.events.push(format!("complete {name}"));
    }

    fn on_keyword_failed(&mut self, _op: Operation, name: &str) {
        self.events.push(format!("failed {name}"));
    }
}
