pub mod catalog;
pub mod init;
pub mod mark;
pub mod rekey;
pub mod status;

use crate::Context;
use crate::cli::{Cli, Command};
use crate::error::Result;
use crate::registry::{Operation, Registry};
use clap::CommandFactory;
use clap_complete::generate;
use std::io;

/// Run one parsed command against the built-in catalog.
pub fn run(ctx: &Context, command: Command) -> Result<()> {
    let registry = Registry::builtin();

    match command {
        Command::Init => init::run(ctx),
        Command::Add { names } => mark::run(ctx, &registry, Operation::Install, &names),
        Command::Remove { names } => mark::run(ctx, &registry, Operation::Remove, &names),
        Command::List => {
            catalog::list(&registry);
            Ok(())
        }
        Command::Describe { name } => catalog::describe(&registry, &name),
        Command::Installed => catalog::installed(ctx, &registry),
        Command::Status => status::run(ctx, &registry),
        Command::Rekey { kind } => rekey::run(ctx, kind),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "tuffix", &mut io::stdout());
            Ok(())
        }
    }
}
