//! `add` and `remove`.

use crate::Context;
use crate::error::{Error, Result};
use crate::progress::{AutoConfirm, ConfirmCallback, ConsoleProgress, PromptConfirm};
use crate::reconcile::{Outcome, Reconciler};
use crate::registry::{Operation, Registry, SetupContext};
use crate::state::StateStore;
use crate::sudo::{InvokingUser, ProcessPrivilege};
use crate::ui;

pub fn run(ctx: &Context, registry: &Registry, op: Operation, names: &[String]) -> Result<()> {
    let config = &ctx.config;
    let store = StateStore::new(&config.state_path);
    let privilege = ProcessPrivilege;

    let mut confirm: Box<dyn ConfirmCallback> = if config.assume_yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(PromptConfirm)
    };
    let mut progress = ConsoleProgress::new(ctx.verbose, ctx.quiet);

    let connect = || -> Result<SetupContext> {
        let client = aptkit::Client::new()
            .map_err(|e| Error::environment(e.to_string()))?
            .with_retry(config.retry.clone());
        let user = InvokingUser::detect(&privilege)
            .inspect_err(|e| log::warn!("{e}"))
            .ok();
        Ok(SetupContext {
            client,
            git: config.git.clone(),
            user,
        })
    };

    let outcome = Reconciler::new(
        registry,
        &store,
        &privilege,
        confirm.as_mut(),
        &mut progress,
    )
    .assume_yes(config.assume_yes)
    .run(op, names, connect)?;

    match outcome {
        Outcome::Applied(applied) if applied.is_empty() => {
            if !ctx.quiet {
                ui::info(&format!("Nothing to {}", op.infinitive()));
            }
        }
        Outcome::Applied(applied) => {
            log::info!("{} {} keyword(s): {}", op.past(), applied.len(), applied.join(", "));
        }
        Outcome::Cancelled => {
            if !ctx.quiet {
                ui::warn("Cancelled, nothing was changed");
            }
        }
    }
    Ok(())
}
