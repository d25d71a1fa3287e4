use crate::Context;
use crate::cli::KeyKind;
use crate::error::{Error, Result};
use crate::keygen::{GpgRequest, KeyGenerator, SystemKeyGenerator};
use crate::registry::Registry;
use crate::state::StateStore;
use crate::sudo::{InvokingUser, ProcessPrivilege};
use crate::ui;
use dialoguer::{Input, Password};

pub fn run(ctx: &Context, kind: KeyKind) -> Result<()> {
    // keys are only regenerated on an initialized machine
    StateStore::new(&ctx.config.state_path).load_verified(&Registry::builtin())?;

    let user = InvokingUser::detect(&ProcessPrivilege)?;
    let generator = SystemKeyGenerator::new(ctx.config.key_server.clone());
    run_with(ctx, kind, &user, &generator)
}

fn run_with(
    ctx: &Context,
    kind: KeyKind,
    user: &InvokingUser,
    generator: &dyn KeyGenerator,
) -> Result<()> {
    match kind {
        KeyKind::Ssh => {
            let passphrase = prompt_passphrase("SSH key passphrase (empty for none)")?;
            ui::tagged_info(&format!("Generating ssh key pair for {}", user.name));
            let public = generator
                .generate_ssh_key_pair(user, passphrase.as_deref())
                .map_err(|e| Error::from_helper(&e))?;
            ui::success(&format!("Public key written to {}", public.display()));
        }
        KeyKind::Gpg => {
            let request = prompt_gpg_request(ctx)?;
            ui::tagged_info("Please wait a moment, this may take some time");
            let export = generator
                .generate_gpg_key_pair(user, &request)
                .map_err(|e| Error::from_helper(&e))?;
            ui::success(&format!("Keys exported to {}", export.display()));
        }
    }
    Ok(())
}

fn prompt_error(e: &dialoguer::Error) -> Error {
    Error::environment(format!("could not read input: {e}"))
}

fn prompt_passphrase(prompt: &str) -> Result<Option<String>> {
    let passphrase = Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map_err(|e| prompt_error(&e))?;
    Ok(Some(passphrase).filter(|p| !p.is_empty()))
}

/// Ask for the key identity, defaulting to the configured git identity.
fn prompt_gpg_request(ctx: &Context) -> Result<GpgRequest> {
    let git = ctx.config.git.as_ref();

    let mut name = Input::<String>::new().with_prompt("Name");
    if let Some(identity) = git {
        name = name.default(identity.name.clone());
    }
    let name = name.interact_text().map_err(|e| prompt_error(&e))?;

    let mut email = Input::<String>::new().with_prompt("Email");
    if let Some(identity) = git {
        email = email.default(identity.email.clone());
    }
    let email = email.interact_text().map_err(|e| prompt_error(&e))?;

    Ok(GpgRequest {
        name,
        email,
        passphrase: prompt_passphrase("GPG key passphrase (empty for none)")?,
    })
}
