use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        PossibleValuesParser, ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(crate::build_info::long_version().into_boxed_str());

    Command::new("adpa")
        .about("ADPA member portal session client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Identity and portal API base URL, example: https://api.adpa.org")
                .env("ADPA_API_BASE_URL")
                .default_value("http://localhost:8000")
                .global(true),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .help("Session file (default: $HOME/.config/adpa/session.json)")
                .env("ADPA_STORE")
                .global(true),
        )
        .arg(
            Arg::new("login-path")
                .long("login-path")
                .help("Login page path used for redirects")
                .env("ADPA_LOGIN_PATH")
                .default_value("/login")
                .global(true),
        )
        .arg(
            Arg::new("protected")
                .long("protected")
                .help("Member-only path prefixes, comma separated")
                .env("ADPA_PROTECTED")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .default_value("/portal")
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Request timeout in seconds")
                .env("ADPA_TIMEOUT")
                .default_value("10")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .help("Log output format")
                .env("ADPA_LOG_FORMAT")
                .default_value("pretty")
                .value_parser(PossibleValuesParser::new(["pretty", "json"]))
                .global(true),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("ADPA_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and store the session")
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Account email")
                        .env("ADPA_EMAIL")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Account password")
                        .env("ADPA_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Login location the user was sent to, example: /login?redirect=%2Fportal"),
                ),
        )
        .subcommand(Command::new("logout").about("End the session"))
        .subcommand(Command::new("refresh").about("Exchange the refresh token for a new access token"))
        .subcommand(Command::new("whoami").about("Show the cached user profile"))
        .subcommand(Command::new("status").about("Show the session state"))
        .subcommand(
            Command::new("get")
                .about("Send an authenticated GET request to the portal API")
                .arg(Arg::new("path").help("API path, example: /members/me").required(true)),
        )
        .subcommand(
            Command::new("open")
                .about("Check whether a site location may be rendered")
                .arg(
                    Arg::new("location")
                        .help("Site location, example: /portal/events")
                        .required(true),
                ),
        )
}
