use crate::{
    api,
    gate::{AuthConfig, AuthGate},
    mail::{EmailSender, LogEmailSender, SmtpConfig, SmtpEmailSender},
    store::{AuthStore, PgStore},
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub session_ttl_seconds: i64,
    pub secure_cookies: bool,
    pub mail_server: String,
    pub mail_port: u16,
    pub mail_starttls: bool,
    pub mail_username: Option<String>,
    pub mail_password: Option<SecretString>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable, the schema cannot be applied,
/// the SMTP settings are invalid, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let store = PgStore::connect(&args.dsn).await?;
    store
        .apply_schema()
        .await
        .context("Failed to apply database schema")?;

    let purged = store
        .purge_expired_sessions()
        .await
        .context("Failed to purge expired sessions")?;
    info!(purged, "expired sessions purged at startup");

    let mailer = build_mailer(&args)?;

    let auth_config = AuthConfig::new()
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_secure_cookies(args.secure_cookies);

    let gate = Arc::new(AuthGate::new(auth_config, Arc::new(store), mailer));

    api::new(args.port, gate).await
}

fn build_mailer(args: &Args) -> Result<Arc<dyn EmailSender>> {
    let (Some(username), Some(password)) = (&args.mail_username, &args.mail_password) else {
        warn!("SMTP credentials not set, welcome emails will only be logged");
        return Ok(Arc::new(LogEmailSender));
    };

    let password = SecretString::from(password.expose_secret().to_string());
    let config = SmtpConfig::new(args.mail_server.clone(), username.clone(), password)
        .with_port(args.mail_port)
        .with_starttls(args.mail_starttls);
    info!(
        server = config.server(),
        port = config.port(),
        starttls = config.starttls(),
        "SMTP delivery enabled"
    );
    Ok(Arc::new(
        SmtpEmailSender::new(&config).context("Invalid SMTP configuration")?,
    ))
}

fn log_startup_args(args: &Args) {
    debug!(
        port = args.port,
        dsn = %redact_dsn(&args.dsn),
        session_ttl_seconds = args.session_ttl_seconds,
        secure_cookies = args.secure_cookies,
        mail_server = %args.mail_server,
        mail_port = args.mail_port,
        "starting server"
    );
}

/// Mask the password component so the DSN can be logged.
fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => "<invalid dsn>".to_string(),
    }
}
