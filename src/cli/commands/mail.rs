use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_MAIL_SERVER: &str = "mail-server";
pub const ARG_MAIL_PORT: &str = "mail-port";
pub const ARG_MAIL_STARTTLS: &str = "mail-starttls";
pub const ARG_MAIL_USERNAME: &str = "mail-username";
pub const ARG_MAIL_PASSWORD: &str = "mail-password";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MAIL_SERVER)
                .long(ARG_MAIL_SERVER)
                .help("SMTP relay host")
                .env("CARDBASE_MAIL_SERVER")
                .default_value("smtp.gmail.com"),
        )
        .arg(
            Arg::new(ARG_MAIL_PORT)
                .long(ARG_MAIL_PORT)
                .help("SMTP relay port")
                .env("CARDBASE_MAIL_PORT")
                .default_value("465")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_MAIL_STARTTLS)
                .long(ARG_MAIL_STARTTLS)
                .help("Use STARTTLS instead of implicit TLS")
                .env("CARDBASE_MAIL_STARTTLS")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_MAIL_USERNAME)
                .long(ARG_MAIL_USERNAME)
                .help("SMTP username, also used as the sender address. Mail is only logged when unset")
                .env("CARDBASE_MAIL_USERNAME")
                .requires(ARG_MAIL_PASSWORD),
        )
        .arg(
            Arg::new(ARG_MAIL_PASSWORD)
                .long(ARG_MAIL_PASSWORD)
                .help("SMTP password")
                .env("CARDBASE_MAIL_PASSWORD")
                .hide_env_values(true),
        )
}

#[derive(Debug)]
pub struct Options {
    pub server: String,
    pub port: u16,
    pub starttls: bool,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl Options {
    /// # Errors
    /// Returns an error if a defaulted argument is unexpectedly missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let server = matches
            .get_one::<String>(ARG_MAIL_SERVER)
            .cloned()
            .context("missing required argument: --mail-server")?;
        let port = matches
            .get_one::<u16>(ARG_MAIL_PORT)
            .copied()
            .context("missing required argument: --mail-port")?;

        Ok(Self {
            server,
            port,
            starttls: matches.get_flag(ARG_MAIL_STARTTLS),
            username: matches.get_one::<String>(ARG_MAIL_USERNAME).cloned(),
            password: matches
                .get_one::<String>(ARG_MAIL_PASSWORD)
                .cloned()
                .map(SecretString::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const VARS: [&str; 5] = [
        "CARDBASE_MAIL_SERVER",
        "CARDBASE_MAIL_PORT",
        "CARDBASE_MAIL_STARTTLS",
        "CARDBASE_MAIL_USERNAME",
        "CARDBASE_MAIL_PASSWORD",
    ];

    fn cleared<F: FnOnce() -> R, R>(f: F) -> R {
        temp_env::with_vars(VARS.map(|name| (name, None::<&str>)), f)
    }

    #[test]
    fn defaults_use_implicit_tls_without_credentials() {
        cleared(|| {
            let matches = with_args(Command::new("t")).get_matches_from(vec!["t"]);
            let options = Options::parse(&matches).expect("defaults");
            assert_eq!(options.server, "smtp.gmail.com");
            assert_eq!(options.port, 465);
            assert!(!options.starttls);
            assert!(options.username.is_none());
            assert!(options.password.is_none());
        });
    }

    #[test]
    fn credentials_from_env() {
        cleared(|| {
            temp_env::with_vars(
                [
                    ("CARDBASE_MAIL_USERNAME", Some("team@cardbase.app")),
                    ("CARDBASE_MAIL_PASSWORD", Some("app-password")),
                    ("CARDBASE_MAIL_PORT", Some("587")),
                    ("CARDBASE_MAIL_STARTTLS", Some("true")),
                ],
                || {
                    let matches = with_args(Command::new("t")).get_matches_from(vec!["t"]);
                    let options = Options::parse(&matches).expect("env");
                    assert_eq!(options.username.as_deref(), Some("team@cardbase.app"));
                    assert_eq!(
                        options.password.as_ref().map(|p| p.expose_secret().to_string()),
                        Some("app-password".to_string())
                    );
                    assert_eq!(options.port, 587);
                    assert!(options.starttls);
                    assert!(!format!("{options:?}").contains("app-password"));
                },
            );
        });
    }

    #[test]
    fn username_requires_password() {
        cleared(|| {
            let result = with_args(Command::new("t")).try_get_matches_from(vec![
                "t",
                "--mail-username",
                "team@cardbase.app",
            ]);
            assert_eq!(
                result.map(|_| ()).map_err(|e| e.kind()),
                Err(clap::error::ErrorKind::MissingRequiredArgument)
            );
        });
    }
}
