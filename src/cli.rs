use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "tuffix")]
#[command(version)]
#[command(about = "Provision a Tuffix development environment from named keywords", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize tuffix
    Init,

    /// Install keywords (or "all")
    Add {
        /// Keywords to install
        #[arg(required = true, value_name = "KEYWORD")]
        names: Vec<String>,
    },

    /// Remove keywords (or "all")
    Remove {
        /// Keywords to remove
        #[arg(required = true, value_name = "KEYWORD")]
        names: Vec<String>,
    },

    /// List all available keywords
    List,

    /// Describe a keyword
    Describe {
        /// Keyword to describe
        #[arg(value_name = "KEYWORD")]
        name: String,
    },

    /// List installed keywords
    Installed,

    /// Status of the current host
    Status,

    /// Regenerate the ssh or gpg key
    Rekey {
        #[arg(value_enum)]
        kind: KeyKind,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyKind {
    Ssh,
    Gpg,
}
