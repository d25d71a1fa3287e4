//! SSH and GPG key generation for the invoking user.
//!
//! Everything runs through [`InvokingUser::command`] so the keys land in the
//! user's home owned by the user, even under `sudo tuffix rekey`.

use crate::runner;
use crate::sudo::InvokingUser;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// RSA modulus size for both key kinds
const KEY_BITS: u32 = 4096;

/// Export file written next to the user's keyring
pub const GPG_EXPORT_FILE: &str = "tuffix_key.asc";

/// Identity for a new GPG key.
#[derive(Debug, Clone)]
pub struct GpgRequest {
    pub name: String,
    pub email: String,
    /// `None` creates an unprotected key
    pub passphrase: Option<String>,
}

pub trait KeyGenerator {
    /// Replace `~/.ssh/id_rsa` and return the public key path.
    fn generate_ssh_key_pair(&self, user: &InvokingUser, passphrase: Option<&str>)
    -> Result<PathBuf>;

    /// Create a key in the user's keyring and return the export path.
    fn generate_gpg_key_pair(&self, user: &InvokingUser, request: &GpgRequest) -> Result<PathBuf>;
}

/// Shells out to `ssh-keygen` and `gpg`.
pub struct SystemKeyGenerator {
    /// Where `ssh-copy-id` sends the new public key
    key_server: Option<String>,
}

impl SystemKeyGenerator {
    pub fn new(key_server: Option<String>) -> Self {
        Self { key_server }
    }

    fn ensure_private_dir(user: &InvokingUser, dir: &Path) -> Result<()> {
        let mut mkdir = user.command("mkdir");
        mkdir.args(["-p", "-m", "700"]).arg(dir);
        runner::run_capture(mkdir)?;
        Ok(())
    }
}

impl KeyGenerator for SystemKeyGenerator {
    fn generate_ssh_key_pair(
        &self,
        user: &InvokingUser,
        passphrase: Option<&str>,
    ) -> Result<PathBuf> {
        let mut tools = vec!["ssh-keygen"];
        if self.key_server.is_some() {
            tools.push("ssh-copy-id");
        }
        for tool in tools {
            if !runner::command_exists(tool) {
                anyhow::bail!("{tool} is not installed; run $ sudo tuffix add base");
            }
        }

        let ssh_dir = user.home.join(".ssh");
        Self::ensure_private_dir(user, &ssh_dir)?;

        let private = ssh_dir.join("id_rsa");
        let mut keygen = user.command("ssh-keygen");
        keygen.args(ssh_keygen_args(&private, passphrase, &user.name));
        // answers ssh-keygen's overwrite question when a key already exists
        runner::run_with_input(keygen, "y\n")
            .with_context(|| format!("could not generate {}", private.display()))?;

        let public = public_key_path(&private);
        if let Some(server) = &self.key_server {
            log::info!("Copying {} to {server}", public.display());
            let mut copy = user.command("ssh-copy-id");
            copy.arg("-i").arg(&public).arg(server);
            runner::run(copy)?;
        } else {
            log::debug!("No key_server configured, not copying the public key");
        }
        Ok(public)
    }

    fn generate_gpg_key_pair(&self, user: &InvokingUser, request: &GpgRequest) -> Result<PathBuf> {
        if !runner::command_exists("gpg") {
            anyhow::bail!("gpg is not installed; run $ sudo tuffix add base");
        }

        let gnupg_dir = user.home.join(".gnupg");
        Self::ensure_private_dir(user, &gnupg_dir)?;

        let mut generate = user.command("gpg");
        generate.args(["--batch", "--gen-key"]);
        runner::run_with_input(generate, &gpg_batch_script(request))
            .context("gpg key generation failed")?;

        let mut export_public = user.command("gpg");
        export_public.args(["--armor", "--export", &request.email]);
        let public = runner::run_capture(export_public)?;

        let mut export_secret = user.command("gpg");
        export_secret.args(gpg_secret_export_args(request));
        let secret = match gpg_passphrase(request) {
            Some(passphrase) => runner::run_with_input(export_secret, &format!("{passphrase}\n"))?,
            None => runner::run_capture(export_secret)?,
        };

        let export_path = gnupg_dir.join(GPG_EXPORT_FILE);
        let mut write = user.command("sh");
        write
            .args(["-c", "umask 077 && cat > \"$1\"", "sh"])
            .arg(&export_path);
        runner::run_with_input(write, &format!("{public}\n{secret}\n"))
            .with_context(|| format!("could not write {}", export_path.display()))?;
        Ok(export_path)
    }
}

// ============================================================================
// Command builders
// ============================================================================

fn ssh_keygen_args(private: &Path, passphrase: Option<&str>, owner: &str) -> Vec<String> {
    vec![
        "-t".to_string(),
        "rsa".to_string(),
        "-b".to_string(),
        KEY_BITS.to_string(),
        "-f".to_string(),
        private.display().to_string(),
        "-N".to_string(),
        passphrase.unwrap_or_default().to_string(),
        "-C".to_string(),
        format!("{owner} (tuffix)"),
    ]
}

fn public_key_path(private: &Path) -> PathBuf {
    let mut name = private.as_os_str().to_os_string();
    name.push(".pub");
    PathBuf::from(name)
}

/// Unattended key generation parameters for `gpg --batch --gen-key`.
fn gpg_batch_script(request: &GpgRequest) -> String {
    let mut script = format!(
        "Key-Type: RSA\n\
         Key-Length: {KEY_BITS}\n\
         Name-Real: {name}\n\
         Name-Comment: Autogenerated by tuffix for {name}\n\
         Name-Email: {email}\n\
         Expire-Date: 0\n",
        name = request.name,
        email = request.email,
    );
    match &request.passphrase {
        Some(passphrase) if !passphrase.is_empty() => {
            script.push_str(&format!("Passphrase: {passphrase}\n"));
        }
        _ => script.push_str("%no-protection\n"),
    }
    script.push_str("%commit\n");
    script
}

fn gpg_passphrase(request: &GpgRequest) -> Option<&str> {
    request.passphrase.as_deref().filter(|p| !p.is_empty())
}

/// The passphrase itself goes to gpg on stdin, never on the command line.
fn gpg_secret_export_args(request: &GpgRequest) -> Vec<String> {
    let mut args = vec!["--batch".to_string(), "--armor".to_string()];
    if gpg_passphrase(request).is_some() {
        args.extend([
            "--pinentry-mode".to_string(),
            "loopback".to_string(),
            "--passphrase-fd".to_string(),
            "0".to_string(),
        ]);
    }
    args.extend(["--export-secret-keys".to_string(), request.email.clone()]);
    args
}
