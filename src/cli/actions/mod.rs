pub mod request;
pub mod session;

// Internal "interpreter" for `Action`.
mod run;

use crate::{
    api::ReqwestTransport,
    auth::{AuthProvider, FileStore, History, Navigator},
    cli::globals::GlobalArgs,
};
use anyhow::{Context, Result};
use std::sync::Arc;

#[derive(Debug)]
pub enum Action {
    Login(session::LoginArgs),
    Logout,
    Refresh,
    Whoami,
    Status,
    Get(request::GetArgs),
    Open(request::OpenArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self, globals: &GlobalArgs) -> Result<()> {
        run::execute(self, globals).await
    }
}

pub(crate) type Provider = AuthProvider<ReqwestTransport, FileStore>;

/// Wires the file-backed session store, the HTTP transport and a history
/// starting at `location` into one provider.
pub(crate) fn provider(globals: &GlobalArgs, location: &str) -> Result<(Provider, Arc<History>)> {
    let config = globals.config()?;
    let store = FileStore::open(&config.store_path).with_context(|| {
        format!(
            "failed to open session store {}",
            config.store_path.display()
        )
    })?;
    let transport = ReqwestTransport::new(&config)?;
    let history = Arc::new(History::new(location));

    let provider = AuthProvider::new(
        &config,
        transport,
        store,
        Arc::clone(&history) as Arc<dyn Navigator>,
    );

    Ok((provider, history))
}
