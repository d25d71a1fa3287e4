//! The host diagnostic report shown by `tuffix status`.

use crate::error::Result;
use crate::gpu::Graphics;
use crate::{passwd, proc, release};
use std::process::Command;

const UNKNOWN: &str = "unknown";

/// Facts the caller knows better than the host probes do.
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    /// The invoking (non-root) user
    pub user: String,
    /// Installed keyword names, in display order
    pub installed: Vec<String>,
    /// `user.email` from the user's git configuration
    pub git_email: Option<String>,
    /// `user.name` from the user's git configuration
    pub git_name: Option<String>,
}

/// A fully collected report. `None` fields failed to probe.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub user: String,
    pub hostname: Option<String>,
    pub os: Option<String>,
    pub model: Option<String>,
    pub kernel: Option<String>,
    pub uptime: Option<String>,
    pub shell: Option<String>,
    pub terminal: Option<String>,
    pub cpu: Option<String>,
    pub graphics: Option<Graphics>,
    pub memory_gb: Option<u64>,
    pub time: String,
    pub git_email: Option<String>,
    pub git_name: Option<String>,
    pub installed: Vec<String>,
    pub online: Option<bool>,
}

fn probe<T>(what: &str, result: Result<T>) -> Option<T> {
    result
        .map_err(|e| log::debug!("status probe {what} failed: {e}"))
        .ok()
}

impl Report {
    /// Run every probe against the live host.
    pub fn collect(input: &ReportInput) -> Self {
        let account = probe("passwd", passwd::lookup(&input.user));
        Self {
            user: input.user.clone(),
            hostname: probe("hostname", proc::hostname()),
            os: probe("os", release::operating_system()),
            model: probe("model", proc::hardware_model()),
            kernel: probe("kernel", proc::kernel_release()),
            uptime: probe("uptime", proc::uptime()).map(proc::format_uptime),
            shell: account.map(|entry| describe_shell(&entry)),
            terminal: probe("terminal", proc::terminal_emulator()),
            cpu: probe("cpu", proc::CpuInfo::load()).map(|cpu| cpu.to_string()),
            graphics: probe("gpu", Graphics::probe()),
            memory_gb: probe("memory", proc::memory_gb()),
            time: chrono::Local::now()
                .format("%a %d %B %Y %H:%M:%S")
                .to_string(),
            git_email: input.git_email.clone(),
            git_name: input.git_name.clone(),
            installed: input.installed.clone(),
            online: probe("network", proc::has_network_link()),
        }
    }

    /// Render the report, one display line per entry.
    pub fn lines(&self) -> Vec<String> {
        let show = |value: &Option<String>| value.clone().unwrap_or_else(|| UNKNOWN.to_string());
        let (primary, secondary) = match &self.graphics {
            Some(g) => (
                show(&g.primary),
                g.secondary.clone().unwrap_or_else(|| "None".to_string()),
            ),
            None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
        };

        let mut lines = vec![
            format!(
                "{}@{}",
                self.user,
                self.hostname.as_deref().unwrap_or(UNKNOWN)
            ),
            "-----".to_string(),
            format!("OS: {}", show(&self.os)),
            format!("Model: {}", show(&self.model)),
            format!("Kernel: {}", show(&self.kernel)),
            format!("Uptime: {}", show(&self.uptime)),
            format!("Shell: {}", show(&self.shell)),
            format!("Terminal: {}", show(&self.terminal)),
            format!("CPU: {}", show(&self.cpu)),
            "GPU:".to_string(),
            format!("  - Primary: {primary}"),
            format!("  - Secondary: {secondary}"),
            format!(
                "Memory: {}",
                self.memory_gb
                    .map_or_else(|| UNKNOWN.to_string(), |gb| format!("{gb} GB"))
            ),
            format!("Current Time: {}", self.time),
            "Git Configuration:".to_string(),
            format!("  - Email: {}", self.git_email.as_deref().unwrap_or("None")),
            format!("  - Username: {}", self.git_name.as_deref().unwrap_or("None")),
            "Installed keywords:".to_string(),
        ];

        if self.installed.is_empty() {
            lines.push("None".to_string());
        } else {
            lines.extend(self.installed.iter().map(|name| format!("  -  {name}")));
        }

        let online = match self.online {
            Some(true) => "Yes",
            Some(false) => "No",
            None => UNKNOWN,
        };
        lines.push(format!("Connected to Internet: {online}"));
        lines
    }
}

/// Collect and render the report in one step.
pub fn collect_report(input: &ReportInput) -> Vec<String> {
    Report::collect(input).lines()
}

/// Shell name plus the version it reports, e.g. `bash 5.0.17(1)-release`.
fn describe_shell(entry: &passwd::PasswdEntry) -> String {
    let name = entry.shell_name().to_string();
    Command::new(&entry.shell)
        .arg("--version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| parse_shell_version(&String::from_utf8_lossy(&output.stdout)))
        .map_or(name.clone(), |version| format!("{name} {version}"))
}

/// Pull the version token out of a shell's `--version` banner.
fn parse_shell_version(banner: &str) -> Option<String> {
    let first = banner.lines().next()?;
    let mut words = first.split_whitespace();
    // "GNU bash, version 5.0.17(1)-release" / "zsh 5.8 (x86_64-ubuntu-linux-gnu)"
    if let Some(pos) = first.split_whitespace().position(|w| w == "version") {
        return words.nth(pos + 1).map(str::to_string);
    }
    words
        .find(|w| w.starts_with(|c: char| c.is_ascii_digit()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        Report {
            user: "student".into(),
            hostname: Some("tuffix-vm".into()),
            os: Some("Ubuntu".into()),
            kernel: Some("5.4.0-42-generic".into()),
            cpu: Some("Intel(R) Core(TM) i7-8650U CPU @ 1.90GHz (4 cores)".into()),
            graphics: Some(Graphics {
                primary: Some("Intel Corporation UHD Graphics 620".into()),
                secondary: None,
            }),
            memory_gb: Some(16),
            time: "Mon 19 October 2026 10:00:00".into(),
            git_email: Some("student@csu.fullerton.edu".into()),
            git_name: Some("Student".into()),
            installed: vec!["base".into(), "c121".into()],
            online: Some(true),
            ..Report::default()
        }
    }

    #[test]
    fn test_lines_layout() {
        let lines = sample().lines();
        assert_eq!(lines[0], "student@tuffix-vm");
        assert_eq!(lines[1], "-----");
        assert_eq!(lines[2], "OS: Ubuntu");
        assert_eq!(lines[3], "Model: unknown");
        assert_eq!(lines[10], "  - Primary: Intel Corporation UHD Graphics 620");
        assert_eq!(lines[11], "  - Secondary: None");
        assert_eq!(lines[12], "Memory: 16 GB");
        assert_eq!(lines[15], "  - Email: student@csu.fullerton.edu");
        assert_eq!(lines[16], "  - Username: Student");
        assert_eq!(lines[17], "Installed keywords:");
        assert_eq!(lines[18], "  -  base");
        assert_eq!(lines[19], "  -  c121");
        assert_eq!(lines.last().unwrap(), "Connected to Internet: Yes");
    }

    #[test]
    fn test_failed_probes_render_unknown() {
        let lines = Report {
            user: "student".into(),
            ..Report::default()
        }
        .lines();
        assert_eq!(lines[0], "student@unknown");
        assert!(lines.contains(&"CPU: unknown".to_string()));
        assert!(lines.contains(&"  - Primary: unknown".to_string()));
        assert!(lines.contains(&"Memory: unknown".to_string()));
        assert!(lines.contains(&"None".to_string()));
        assert_eq!(lines.last().unwrap(), "Connected to Internet: unknown");
    }

    #[test]
    fn test_parse_shell_version() {
        assert_eq!(
            parse_shell_version("GNU bash, version 5.0.17(1)-release (x86_64-pc-linux-gnu)\nCopyright"),
            Some("5.0.17(1)-release".to_string())
        );
        assert_eq!(
            parse_shell_version("zsh 5.8 (x86_64-ubuntu-linux-gnu)\n"),
            Some("5.8".to_string())
        );
        assert_eq!(parse_shell_version(""), None);
    }
}
