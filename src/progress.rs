//! Progress reporting and confirmation hooks for the reconciler.
//!
//! The reconciler only talks to these traits; the console implementations
//! print `[INFO]` lines and a spinner, the no-op ones keep tests quiet.

use crate::error::{Error, Result};
use crate::registry::Operation;
use crate::ui;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, IsTerminal};
use std::time::Duration;

pub trait ProgressCallback {
    /// Called before a keyword's packages are touched
    fn on_keyword_start(&mut self, op: Operation, name: &str);

    /// Called after a keyword was applied and recorded
    fn on_keyword_complete(&mut self, op: Operation, name: &str);

    /// Called when a keyword failed; the batch stops afterwards
    fn on_keyword_failed(&mut self, op: Operation, name: &str);
}

pub trait ConfirmCallback {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

// ============================================================================
// No-op implementations
// ============================================================================

pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_keyword_start(&mut self, _op: Operation, _name: &str) {}
    fn on_keyword_complete(&mut self, _op: Operation, _name: &str) {}
    fn on_keyword_failed(&mut self, _op: Operation, _name: &str) {}
}

/// Always confirms (`--yes`)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Always declines
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

// ============================================================================
// Console implementations
// ============================================================================

/// `[INFO]` lines plus a spinner while apt runs. `--quiet` silences both.
pub struct ConsoleProgress {
    info_enabled: bool,
    /// Spinner is hidden under `-v`, where log lines would break it
    spinner_enabled: bool,
    spinner: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new(verbose: u8, quiet: bool) -> Self {
        Self::for_terminal(verbose, quiet, std::io::stdout().is_terminal())
    }

    fn for_terminal(verbose: u8, quiet: bool, terminal: bool) -> Self {
        Self {
            info_enabled: !quiet,
            spinner_enabled: verbose == 0 && !quiet && terminal,
            spinner: None,
        }
    }

    fn info(&self, message: &str) {
        if self.info_enabled {
            ui::tagged_info(message);
        }
    }

    fn start_spinner(&mut self, msg: String) {
        if !self.spinner_enabled {
            return;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        }
        pb.set_message(msg);
        pb.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(pb);
    }

    fn stop_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_keyword_start(&mut self, op: Operation, name: &str) {
        self.info(&format!("tuffix: {} {name}", op.verb()));
        self.start_spinner(format!("apt is {} packages for {name}...", op.verb()));
    }

    fn on_keyword_complete(&mut self, op: Operation, name: &str) {
        self.stop_spinner();
        self.info(&format!("tuffix: successfully {} {name}", op.past()));
    }

    fn on_keyword_failed(&mut self, _op: Operation, _name: &str) {
        self.stop_spinner();
    }
}

/// Asks on the terminal; without one, reads a single line from stdin where
/// end-of-input means "no".
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if console::user_attended() && std::io::stdin().is_terminal() {
            return dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact_opt()
                .map(|answer| answer.unwrap_or(false))
                .map_err(|e| Error::environment(format!("could not read confirmation: {e}")));
        }

        println!("{prompt} [y/N]");
        read_answer(&mut std::io::stdin().lock())
    }
}

/// Parse one line of a non-interactive answer.
fn read_answer(input: &mut impl BufRead) -> Result<bool> {
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| Error::io("could not read confirmation", e))?;
    if read == 0 {
        return Ok(false);
    }
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
