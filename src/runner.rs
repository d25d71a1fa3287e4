use anyhow::{Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};

/// Render a command line for messages
fn describe(command: &Command) -> String {
    let mut parts = vec![command.get_program().to_string_lossy().to_string()];
    parts.extend(command.get_args().map(|a| a.to_string_lossy().to_string()));
    parts.join(" ")
}

/// Run a command with inherited stdio (shows output in real-time)
pub fn run(mut command: Command) -> Result<()> {
    let line = describe(&command);
    let status = command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to execute: {line}"))?;

    if !status.success() {
        anyhow::bail!("Command failed ({status}): {line}");
    }
    Ok(())
}

/// Run a command and capture output
pub fn run_capture(mut command: Command) -> Result<String> {
    let line = describe(&command);
    let output = command
        .output()
        .with_context(|| format!("Failed to execute: {line}"))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Command failed: {line}: {}", stderr.trim())
    }
}

/// Run a command feeding `input` on stdin, capturing stdout
pub fn run_with_input(mut command: Command, input: &str) -> Result<String> {
    let line = describe(&command);
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to execute: {line}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .with_context(|| format!("Failed to write to stdin of {line}"))?;
    }

    let output = child
        .wait_with_output()
        .with_context(|| format!("Failed to wait for {line}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Command failed: {line}: {}", stderr.trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Check if a command exists
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let mut command = Command::new("git");
        command.args(["config", "--global", "user.name", "Tuffy"]);
        assert_eq!(describe(&command), "git config --global user.name Tuffy");
    }

    #[test]
    fn test_run_capture() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo hello"]);
        assert_eq!(run_capture(command).unwrap(), "hello");

        let mut failing = Command::new("sh");
        failing.args(["-c", "echo nope >&2; exit 3"]);
        let err = run_capture(failing).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_run_with_input() {
        let output = run_with_input(Command::new("cat"), "Key-Type: RSA\n").unwrap();
        assert_eq!(output, "Key-Type: RSA");
    }

    #[test]
    fn test_command_exists() {
        assert!(command_exists("sh"));
        assert!(!command_exists("tuffix-definitely-not-a-command"));
    }
}
