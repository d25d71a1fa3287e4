//! Read-only views of the keyword catalog and the installed set.

use crate::Context;
use crate::error::Result;
use crate::registry::{KEYWORD_MAX_LENGTH, Registry};
use crate::state::{InstalledState, StateStore};
use crate::ui;

pub fn list(registry: &Registry) {
    for line in list_lines(registry) {
        println!("{line}");
    }
}

pub fn describe(registry: &Registry, name: &str) -> Result<()> {
    println!("{}", describe_line(registry, name)?);
    Ok(())
}

pub fn installed(ctx: &Context, registry: &Registry) -> Result<()> {
    let state = StateStore::new(&ctx.config.state_path).load_verified(registry)?;
    for line in installed_lines(&state) {
        println!("{line}");
    }
    Ok(())
}

fn list_lines(registry: &Registry) -> Vec<String> {
    let mut lines = vec!["tuffix list of keywords:".to_string()];
    lines.extend(registry.list_all().iter().map(|keyword| {
        format!(
            "{}  {}",
            ui::pad(keyword.name, KEYWORD_MAX_LENGTH),
            keyword.description
        )
    }));
    lines
}

fn describe_line(registry: &Registry, name: &str) -> Result<String> {
    let keyword = registry.find(name)?;
    Ok(format!("{}: {}", keyword.name, keyword.description))
}

fn installed_lines(state: &InstalledState) -> Vec<String> {
    if state.installed.is_empty() {
        return vec!["no keywords are installed".to_string()];
    }
    let mut lines = vec!["tuffix installed keywords:".to_string()];
    lines.extend(state.installed.iter().cloned());
    lines
}
