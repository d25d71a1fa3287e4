mod cli;
mod commands;
mod config;
mod error;
mod keygen;
mod lock;
mod progress;
mod reconcile;
mod registry;
mod runner;
mod state;
mod sudo;
#[cfg(test)]
mod testing;
mod ui;

use clap::error::ErrorKind as ClapErrorKind;
use clap::{CommandFactory, Parser};
use cli::Cli;
use config::BuildConfig;
use error::{Error, ErrorKind, Result};
use std::ffi::OsString;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: BuildConfig,
}

fn init_logging(verbose: u8, quiet: bool) {
    let log_level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // a second call (tests) keeps the first logger
    let _ = env_logger::Builder::new()
        .filter_level(if quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .try_init();
}

/// Parse `argv` and run the selected command.
fn dispatch<I, T>(argv: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
            let _ = e.print();
            return Ok(());
        }
        Err(e) if e.kind() == ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            return Err(Error::usage("you must supply a command"));
        }
        Err(e) => {
            let message = e.render().to_string();
            let first = message
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ")
                .to_string();
            return Err(Error::usage(first));
        }
    };

    init_logging(cli.verbose, cli.quiet);

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: BuildConfig::load(cli.yes)?,
    };
    log::debug!("State file: {}", ctx.config.state_path.display());

    commands::run(&ctx, cli.command)
}

fn main() -> ExitCode {
    match dispatch(std::env::args_os()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::tagged_error(&e.to_string());
            if let Some(hint) = e.hint() {
                eprintln!("  {hint}");
            }
            if e.kind() == ErrorKind::Usage {
                eprintln!("{}", Cli::command().render_usage());
            }
            ExitCode::FAILURE
        }
    }
}
