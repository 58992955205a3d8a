use crate::{
    auth::UserProfile,
    cli::{actions::provider, globals::GlobalArgs},
};
use anyhow::{bail, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

#[derive(Debug)]
pub struct LoginArgs {
    pub email: String,
    pub password: SecretString,
    /// Login location the user arrived at, possibly carrying `?redirect=`.
    pub from: Option<String>,
}

/// # Errors
/// Returns an error if the credentials are rejected or the backend is unreachable.
pub async fn login(args: LoginArgs, globals: &GlobalArgs) -> Result<()> {
    let location = args
        .from
        .clone()
        .unwrap_or_else(|| globals.login_path.clone());
    let (provider, history) = provider(globals, &location)?;

    let session = provider
        .session()
        .login(&args.email, args.password.expose_secret())
        .await?;

    let name = session
        .user
        .as_ref()
        .and_then(UserProfile::display_name)
        .unwrap_or(args.email.trim())
        .to_string();

    let target = provider.guard().resume_target(&location);
    provider.guard().navigate(history.as_ref(), &target);
    debug!(target = %target, "resuming after login");

    println!("signed in as {name}");
    println!("continue to {target}");

    Ok(())
}

/// # Errors
/// Returns an error only if the cleared session cannot be written.
pub async fn logout(globals: &GlobalArgs) -> Result<()> {
    let (provider, _) = provider(globals, "/")?;
    provider.session().logout().await?;
    println!("signed out");
    Ok(())
}

/// # Errors
/// Returns an error if there is nothing to refresh, the refresh token is
/// rejected, or the backend is unreachable.
pub async fn refresh(globals: &GlobalArgs) -> Result<()> {
    let (provider, _) = provider(globals, "/")?;
    match provider.session().refresh().await? {
        Some(_) => println!("access token refreshed"),
        None => bail!(
            "session expired; signed out, sign in again at {}",
            provider.guard().login_path()
        ),
    }
    Ok(())
}

/// # Errors
/// Returns an error if nobody is signed in.
pub fn whoami(globals: &GlobalArgs) -> Result<()> {
    let (provider, _) = provider(globals, "/")?;
    if !provider.session().is_authenticated() {
        bail!("not signed in");
    }
    match provider.session().current_user() {
        Some(user) => println!("{}", serde_json::to_string_pretty(user.as_value())?),
        None => println!("signed in, no cached profile"),
    }
    Ok(())
}

/// # Errors
/// Returns an error if the session store cannot be opened.
pub fn status(globals: &GlobalArgs) -> Result<()> {
    let (provider, _) = provider(globals, "/")?;
    let session = provider.session().session();

    println!("state: {}", provider.state());
    println!("store: {}", provider.session().store().path().display());
    if let Some(user) = &session.user {
        let name = user.display_name().map(str::to_string).or_else(|| user.id());
        println!("user: {}", name.as_deref().unwrap_or("unknown"));
        if let Some(member) = user.is_member() {
            println!("member: {member}");
        }
    }
    println!(
        "refresh token: {}",
        if session.refresh_token.is_some() {
            "stored"
        } else {
            "none"
        }
    );
    Ok(())
}
