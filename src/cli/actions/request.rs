use crate::{
    api::HttpRequest,
    auth::{GuardDecision, Navigator},
    cli::{actions::provider, globals::GlobalArgs},
};
use anyhow::Result;

#[derive(Debug)]
pub struct GetArgs {
    pub path: String,
}

#[derive(Debug)]
pub struct OpenArgs {
    pub location: String,
}

/// Sends an authenticated GET and prints the JSON body.
///
/// # Errors
/// Returns an error for non-2xx statuses, an unrecoverable 401 (the session
/// is cleared by then) and transport failures.
pub async fn get(args: GetArgs, globals: &GlobalArgs) -> Result<()> {
    let (provider, history) = provider(globals, "/")?;
    let client = provider.client();

    match client.send(HttpRequest::get(&args.path)).await {
        Ok(response) if response.is_success() => {
            println!("{}", serde_json::to_string_pretty(&response.body)?);
            Ok(())
        }
        Ok(response) => Err(response.error().into()),
        Err(err) => {
            if err.status() == Some(401) {
                eprintln!("session ended, sign in again at {}", history.current());
            }
            Err(err.into())
        }
    }
}

/// Runs the route guard for `location` and prints the outcome.
///
/// # Errors
/// Returns an error if the session store cannot be opened.
pub fn open(args: &OpenArgs, globals: &GlobalArgs) -> Result<()> {
    let (provider, history) = provider(globals, "/")?;
    match provider.guard().navigate(history.as_ref(), &args.location) {
        GuardDecision::Render => println!("render {}", args.location),
        GuardDecision::Redirect { to } => println!("redirect {to}"),
    }
    Ok(())
}
