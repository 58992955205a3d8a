use crate::cli::{
    actions::{request, session, Action},
    globals::GlobalArgs,
};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Login(args) => session::login(args, globals).await,
        Action::Logout => session::logout(globals).await,
        Action::Refresh => session::refresh(globals).await,
        Action::Whoami => session::whoami(globals),
        Action::Status => session::status(globals),
        Action::Get(args) => request::get(args, globals).await,
        Action::Open(args) => request::open(&args, globals),
    }
}
