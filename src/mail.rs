//! Outbound mail.
//!
//! Registration hands a welcome message to an [`EmailSender`] through [`dispatch`],
//! which runs the blocking send on the blocking pool and only logs the outcome.
//! A failed send never affects the account that triggered it.
//!
//! Without SMTP credentials the server falls back to [`LogEmailSender`].

use anyhow::{Context, Result};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};

pub const WELCOME_SUBJECT: &str = "Welcome to CardBase";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error describing why it was not sent.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Sender that logs the message instead of delivering it.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            "email send stub"
        );
        Ok(())
    }
}

pub struct SmtpConfig {
    server: String,
    port: u16,
    starttls: bool,
    username: String,
    password: SecretString,
}

impl SmtpConfig {
    #[must_use]
    pub fn new(server: String, username: String, password: SecretString) -> Self {
        Self {
            server,
            port: 465,
            starttls: false,
            username,
            password,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_starttls(mut self, starttls: bool) -> Self {
        self.starttls = starttls;
        self
    }

    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn starttls(&self) -> bool {
        self.starttls
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("starttls", &self.starttls)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// SMTP delivery through `lettre`; the account username is also the sender address.
pub struct SmtpEmailSender {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpEmailSender {
    /// # Errors
    /// Returns an error if the relay or the sender address is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let from: Mailbox = config
            .username
            .parse()
            .with_context(|| format!("invalid sender address: {}", config.username))?;

        let builder = if config.starttls {
            SmtpTransport::starttls_relay(&config.server)
        } else {
            SmtpTransport::relay(&config.server)
        }
        .with_context(|| format!("invalid SMTP relay: {}", config.server))?;

        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );
        let transport = builder.port(config.port).credentials(credentials).build();

        Ok(Self { transport, from })
    }
}

impl fmt::Debug for SmtpEmailSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpEmailSender")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl EmailSender for SmtpEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        let to: Mailbox = message
            .to_email
            .parse()
            .with_context(|| format!("invalid recipient address: {}", message.to_email))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .context("failed to build email")?;

        self.transport
            .send(&email)
            .context("SMTP delivery failed")?;
        Ok(())
    }
}

#[must_use]
pub fn welcome_message(email: &str) -> EmailMessage {
    let body = format!(
        "Hi {email},\n\n\
         We are thrilled to welcome you to CardBase.\n\n\
         Your account is ready. Sign in with this email address to get started.\n\n\
         If you have any questions or need assistance, reach out to us at CardBase@gmail.com.\n\n\
         Best regards,\n\n\
         CardBase Team"
    );
    EmailMessage {
        to_email: email.to_string(),
        subject: WELCOME_SUBJECT.to_string(),
        body,
    }
}

/// Send in the background. Failures are logged and never retried.
pub fn dispatch(sender: Arc<dyn EmailSender>, message: EmailMessage) -> JoinHandle<()> {
    let span = info_span!("mail.dispatch", to_email = %message.to_email);
    tokio::spawn(
        async move {
            match tokio::task::spawn_blocking(move || sender.send(&message)).await {
                Ok(Ok(())) => info!("email sent"),
                Ok(Err(err)) => error!("Failed to send email: {err:#}"),
                Err(err) => error!("Email task failed: {err}"),
            }
        }
        .instrument(span),
    )
}
