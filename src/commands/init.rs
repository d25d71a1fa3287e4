use crate::Context;
use crate::error::{Error, Result};
use crate::lock::StateLock;
use crate::state::StateStore;
use crate::ui;
use std::io::ErrorKind as IoErrorKind;

pub fn run(ctx: &Context) -> Result<()> {
    let store = StateStore::new(&ctx.config.state_path);
    if store.exists() {
        return Err(Error::usage("init has already been done"));
    }

    let result = store.create_dir().and_then(|()| {
        let _lock = StateLock::acquire(store.path(), "init")?;
        store.init(&ctx.config.version)
    });
    match result {
        Ok(state) => {
            log::info!(
                "Created {} (version {})",
                store.path().display(),
                state.version
            );
            ui::tagged_info("Tuffix init succeeded");
            Ok(())
        }
        // the default location is root-owned
        Err(Error::Io { source, .. }) if source.kind() == IoErrorKind::PermissionDenied => {
            Err(Error::Permission)
        }
        Err(e) => Err(e),
    }
}
