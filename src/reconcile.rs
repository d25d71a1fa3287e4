//! Turning `add`/`remove` requests into package transactions and state.
//!
//! Every name is validated before anything changes. Keywords are then applied
//! one at a time, and the state file is saved after each success, so an
//! interrupted batch leaves a record of exactly what was applied.

use crate::error::{Error, Result};
use crate::lock::StateLock;
use crate::progress::{ConfirmCallback, ProgressCallback};
use crate::registry::{ALL, Keyword, Operation, Registry, SetupContext};
use crate::state::{InstalledState, StateStore};
use crate::sudo::{self, Privilege};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Keywords changed, in the order they were applied
    Applied(Vec<String>),
    /// The user declined the `all` confirmation; nothing changed
    Cancelled,
}

/// What the user asked for, before the state is consulted.
enum Request<'r> {
    Keywords(Vec<&'r Keyword>),
    All,
}

pub struct Reconciler<'a> {
    registry: &'a Registry,
    store: &'a StateStore,
    privilege: &'a dyn Privilege,
    confirm: &'a mut dyn ConfirmCallback,
    progress: &'a mut dyn ProgressCallback,
    assume_yes: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        registry: &'a Registry,
        store: &'a StateStore,
        privilege: &'a dyn Privilege,
        confirm: &'a mut dyn ConfirmCallback,
        progress: &'a mut dyn ProgressCallback,
    ) -> Self {
        Self {
            registry,
            store,
            privilege,
            confirm,
            progress,
            assume_yes: false,
        }
    }

    /// Skip the confirmation for `all`.
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    /// Apply `op` to `names`.
    ///
    /// `connect` builds the package-manager session and is only called once
    /// the request is valid, confirmed and privileged.
    pub fn run<F>(&mut self, op: Operation, names: &[String], connect: F) -> Result<Outcome>
    where
        F: FnOnce() -> Result<SetupContext>,
    {
        let request = self.parse(names)?;
        let state = self.store.load_verified(self.registry)?;

        let targets = match request {
            Request::Keywords(keywords) => keywords,
            Request::All => {
                let expanded = self.expand_all(op, &state);
                if expanded.is_empty() {
                    log::info!("Nothing to {} for all", op.infinitive());
                    return Ok(Outcome::Applied(Vec::new()));
                }
                let prompt = format!(
                    "are you sure you want to {} all {} keyword(s)?",
                    op.infinitive(),
                    expanded.len()
                );
                if !self.assume_yes && !self.confirm.confirm(&prompt)? {
                    return Ok(Outcome::Cancelled);
                }
                expanded
            }
        };

        sudo::require_elevated(self.privilege)?;

        let command = match op {
            Operation::Install => "add",
            Operation::Remove => "remove",
        };
        let _lock = StateLock::acquire(self.store.path(), command)?;
        let ctx = connect()?;
        // another invocation may have changed the file before we got the lock
        let mut state = self.store.load_verified(self.registry)?;

        let mut applied = Vec::with_capacity(targets.len());
        for keyword in targets {
            self.apply_one(op, keyword, &ctx, &mut state)?;
            applied.push(keyword.name.to_string());
        }
        Ok(Outcome::Applied(applied))
    }

    /// Resolve every name up front so a typo never leaves a half-applied batch.
    fn parse(&self, names: &[String]) -> Result<Request<'a>> {
        if names.is_empty() {
            return Err(Error::usage("you must supply at least one keyword to mark"));
        }
        if names.iter().any(|n| n == ALL) {
            if names.len() > 1 {
                return Err(Error::usage(format!(
                    "\"{ALL}\" cannot be combined with other keywords"
                )));
            }
            return Ok(Request::All);
        }

        let registry = self.registry;
        let keywords = names
            .iter()
            .map(|name| registry.find(name))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Request::Keywords(keywords))
    }

    /// Install: every real keyword. Remove: whatever is installed.
    fn expand_all(&self, op: Operation, state: &InstalledState) -> Vec<&'a Keyword> {
        let registry = self.registry;
        match op {
            Operation::Install => registry.installable().collect(),
            Operation::Remove => state
                .installed
                .iter()
                .filter_map(|name| registry.find(name).ok())
                .collect(),
        }
    }

    fn apply_one(
        &mut self,
        op: Operation,
        keyword: &Keyword,
        ctx: &SetupContext,
        state: &mut InstalledState,
    ) -> Result<()> {
        let name = keyword.name;
        match op {
            Operation::Install if state.contains(name) => {
                return Err(Error::usage(format!(
                    "cannot add {name}, it is already installed"
                )));
            }
            Operation::Remove if !state.contains(name) => {
                return Err(Error::usage(format!(
                    "cannot remove candidate {name}; not installed"
                )));
            }
            _ => {}
        }

        self.progress.on_keyword_start(op, name);
        if let Err(source) = keyword.apply(op, ctx) {
            self.progress.on_keyword_failed(op, name);
            return Err(Error::Setup {
                keyword: name.to_string(),
                verb: op.infinitive(),
                source,
            });
        }

        match op {
            Operation::Install => state.mark(name),
            Operation::Remove => state.unmark(name),
        }
        self.store.save(state)?;
        self.progress.on_keyword_complete(op, name);

        if let Err(e) = ctx.client.autoremove() {
            log::warn!("apt autoremove after {name} failed: {e}");
        }
        Ok(())
    }
}
