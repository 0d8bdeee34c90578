//! Map parsed CLI arguments to the action the binary runs.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, mail, ARG_DSN, ARG_PORT};
use anyhow::{Context, Result};
use url::Url;

/// # Errors
/// Returns an error if required arguments are missing or the DSN is not a URL.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    Url::parse(&dsn).context("invalid CARDBASE_DSN")?;

    let auth_opts = auth::Options::parse(matches)?;
    let mail_opts = mail::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        secure_cookies: auth_opts.secure_cookies,
        mail_server: mail_opts.server,
        mail_port: mail_opts.port,
        mail_starttls: mail_opts.starttls,
        mail_username: mail_opts.username,
        mail_password: mail_opts.password,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleared<F: FnOnce() -> R, R>(f: F) -> R {
        temp_env::with_vars(
            [
                ("CARDBASE_PORT", None::<&str>),
                ("CARDBASE_DSN", None::<&str>),
                ("CARDBASE_SESSION_TTL_SECONDS", None::<&str>),
                ("CARDBASE_SECURE_COOKIES", None::<&str>),
                ("CARDBASE_MAIL_USERNAME", None::<&str>),
                ("CARDBASE_MAIL_PASSWORD", None::<&str>),
            ],
            f,
        )
    }

    #[test]
    fn server_action_from_args() {
        cleared(|| {
            let matches = crate::cli::commands::new().get_matches_from(vec![
                "cardbase",
                "--dsn",
                "postgres://cardbase@localhost:5432/cardbase",
                "--session-ttl-seconds",
                "60",
                "--secure-cookies",
            ]);
            let Ok(Action::Server(args)) = handler(&matches) else {
                panic!("expected server action");
            };
            assert_eq!(args.port, 8080);
            assert_eq!(args.session_ttl_seconds, 60);
            assert!(args.secure_cookies);
            assert!(args.mail_username.is_none());
        });
    }

    #[test]
    fn invalid_dsn_rejected() {
        cleared(|| {
            let matches = crate::cli::commands::new().get_matches_from(vec![
                "cardbase",
                "--dsn",
                "not a url",
            ]);
            let result = handler(&matches);
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(err.to_string().contains("invalid CARDBASE_DSN"));
            }
        });
    }
}
