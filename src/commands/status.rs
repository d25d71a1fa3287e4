use crate::Context;
use crate::error::Result;
use crate::registry::Registry;
use crate::runner;
use crate::state::StateStore;
use crate::sudo::{InvokingUser, ProcessPrivilege};
use hostinfo::ReportInput;

pub fn run(ctx: &Context, registry: &Registry) -> Result<()> {
    let state = StateStore::new(&ctx.config.state_path).load_verified(registry)?;

    let user = InvokingUser::detect(&ProcessPrivilege)
        .inspect_err(|e| log::debug!("{e}"))
        .ok();
    let (git_name, git_email) = user.as_ref().map(read_git_identity).unwrap_or_default();

    let input = ReportInput {
        user: user.map(|u| u.name).unwrap_or_else(|| "unknown".to_string()),
        installed: state.installed,
        git_email,
        git_name,
    };
    for line in hostinfo::collect_report(&input) {
        println!("{line}");
    }
    Ok(())
}

/// `user.name` and `user.email` from the user's global git config.
fn read_git_identity(user: &InvokingUser) -> (Option<String>, Option<String>) {
    let mut command = user.command("git");
    command.args(["--no-pager", "config", "--global", "--list"]);
    match runner::run_capture(command) {
        Ok(listing) => parse_git_identity(&listing),
        Err(e) => {
            log::debug!("git config unavailable: {e:#}");
            (None, None)
        }
    }
}

fn parse_git_identity(listing: &str) -> (Option<String>, Option<String>) {
    let mut name = None;
    let mut email = None;
    for line in listing.lines() {
        match line.split_once('=') {
            Some(("user.name", value)) => name = Some(value.trim().to_string()),
            Some(("user.email", value)) => email = Some(value.trim().to_string()),
            _ => {}
        }
    }
    (name, email)
}
