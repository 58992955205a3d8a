use crate::cli::{
    actions::{request, session, Action},
    globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, time::Duration};

/// # Errors
/// Returns an error if the API URL is missing.
pub fn globals(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let api_url = matches
        .get_one::<String>("api-url")
        .cloned()
        .context("missing required argument: --api-url")?;

    let mut globals = GlobalArgs::new(api_url);
    globals.store_path = matches.get_one::<String>("store").map(PathBuf::from);
    if let Some(login_path) = matches.get_one::<String>("login-path") {
        globals.login_path.clone_from(login_path);
    }
    if let Some(protected) = matches.get_many::<String>("protected") {
        globals.protected = protected.cloned().collect();
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        globals.timeout = Duration::from_secs(*timeout);
    }

    Ok(globals)
}

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let action = match matches.subcommand() {
        Some(("login", sub)) => Action::Login(session::LoginArgs {
            email: sub
                .get_one::<String>("email")
                .cloned()
                .context("missing required argument: --email")?,
            password: sub
                .get_one::<String>("password")
                .cloned()
                .map(SecretString::from)
                .context("missing required argument: --password")?,
            from: sub.get_one::<String>("from").cloned(),
        }),
        Some(("logout", _)) => Action::Logout,
        Some(("refresh", _)) => Action::Refresh,
        Some(("whoami", _)) => Action::Whoami,
        Some(("status", _)) => Action::Status,
        Some(("get", sub)) => Action::Get(request::GetArgs {
            path: sub
                .get_one::<String>("path")
                .cloned()
                .context("missing required argument: <path>")?,
        }),
        Some(("open", sub)) => Action::Open(request::OpenArgs {
            location: sub
                .get_one::<String>("location")
                .cloned()
                .context("missing required argument: <location>")?,
        }),
        Some((name, _)) => return Err(anyhow!("unknown command: {name}")),
        None => return Err(anyhow!("no command given")),
    };

    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    fn matches(args: &[&str]) -> clap::ArgMatches {
        commands::new().get_matches_from(args)
    }

    #[test]
    fn test_handler_login() {
        temp_env::with_vars(
            [("ADPA_EMAIL", None::<&str>), ("ADPA_PASSWORD", Some("s3cret"))],
            || {
                let matches = matches(&[
                    "adpa",
                    "login",
                    "--email",
                    "a@x.com",
                    "--from",
                    "/login?redirect=%2Fportal",
                ]);
                let Action::Login(args) = handler(&matches).unwrap() else {
                    panic!("expected login action");
                };
                assert_eq!(args.email, "a@x.com");
                assert_eq!(args.password.expose_secret(), "s3cret");
                assert_eq!(args.from.as_deref(), Some("/login?redirect=%2Fportal"));
            },
        );
    }

    #[test]
    fn test_handler_positional_commands() {
        let Action::Get(args) = handler(&matches(&["adpa", "get", "/members/me"])).unwrap() else {
            panic!("expected get action");
        };
        assert_eq!(args.path, "/members/me");

        let Action::Open(args) = handler(&matches(&["adpa", "open", "/portal"])).unwrap() else {
            panic!("expected open action");
        };
        assert_eq!(args.location, "/portal");

        assert!(matches!(
            handler(&matches(&["adpa", "logout"])).unwrap(),
            Action::Logout
        ));
    }

    #[test]
    fn test_globals() {
        temp_env::with_vars(
            [
                ("ADPA_API_BASE_URL", None::<&str>),
                ("ADPA_STORE", None),
                ("ADPA_PROTECTED", None),
                ("ADPA_TIMEOUT", None),
            ],
            || {
                let matches = matches(&[
                    "adpa",
                    "--api-url",
                    "https://api.adpa.org",
                    "--store",
                    "/tmp/adpa.json",
                    "--protected",
                    "/portal,/members",
                    "--timeout",
                    "3",
                    "status",
                ]);
                let globals = globals(&matches).unwrap();
                assert_eq!(globals.api_url, "https://api.adpa.org");
                assert_eq!(globals.store_path, Some(PathBuf::from("/tmp/adpa.json")));
                assert_eq!(globals.protected, vec!["/portal", "/members"]);
                assert_eq!(globals.timeout, Duration::from_secs(3));
            },
        );
    }
}
