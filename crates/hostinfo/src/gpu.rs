//! Graphics adapters as reported by `lspci`.

use crate::error::{Error, Result};
use regex::Regex;
use std::process::Command;
use std::sync::LazyLock;

static VGA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"VGA compatible controller:\s*(?P<model>[^(]*)").expect("valid regex")
});

static CONTROLLER_3D_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"3D controller:\s*(?P<model>[^(]*)").expect("valid regex"));

/// Primary and secondary video adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graphics {
    /// First VGA controller
    pub primary: Option<String>,
    /// First 3D controller (discrete GPU on hybrid laptops)
    pub secondary: Option<String>,
}

impl Graphics {
    /// Parse `lspci` output, keeping the first match of each kind.
    pub fn parse(output: &str) -> Self {
        let mut graphics = Self::default();
        for line in output.lines() {
            if graphics.primary.is_none() {
                graphics.primary = capture_model(&VGA_RE, line);
            }
            if graphics.secondary.is_none() {
                graphics.secondary = capture_model(&CONTROLLER_3D_RE, line);
            }
            if graphics.primary.is_some() && graphics.secondary.is_some() {
                break;
            }
        }
        graphics
    }

    /// Run `lspci` and parse its output.
    pub fn probe() -> Result<Self> {
        let lspci = which::which("lspci").map_err(|_| Error::CommandNotFound("lspci".into()))?;
        let output = Command::new(lspci).output()?;
        let graphics = Self::parse(&String::from_utf8_lossy(&output.stdout));
        if graphics.primary.is_none() && graphics.secondary.is_none() {
            return Err(Error::parse(
                "lspci",
                "could not identify primary or secondary video out source",
            ));
        }
        Ok(graphics)
    }
}

fn capture_model(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .map(|caps| caps["model"].trim().to_string())
        .filter(|model| !model.is_empty())
}
