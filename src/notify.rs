use axum::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use std::time::Duration;
use tracing::info;

use crate::auth::repo::Role;
use crate::config::SmtpConfig;

/// Welcome-mail sink invoked after registration commits. Failures are the
/// caller's problem to log, never to propagate.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn welcome(&self, email: &str, username: &str, role: Role) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: SmtpTransport,
    from: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());
        let mailer = SmtpTransport::relay(&config.host)?
            .credentials(creds)
            .port(587)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        info!(host = %config.host, "smtp notifier initialized");
        Ok(Self {
            mailer,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn welcome(&self, email: &str, username: &str, role: Role) -> anyhow::Result<()> {
        let body = format!(
            "Hi {username},\n\n\
             Thank you for signing up as {role}. We hope you enjoy our service.\n\n\
             ~ The Job Board Team\n"
        );
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(email.parse()?)
            .subject("Welcome to the Job Board")
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        // lettre's SmtpTransport is blocking; keep it off the runtime.
        let mailer = self.mailer.clone();
        tokio::task::spawn_blocking(move || mailer.send(&message)).await??;

        info!(to = %email, "welcome email sent");
        Ok(())
    }
}

/// Used in tests and when SMTP is unconfigured.
#[derive(Clone)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn welcome(&self, _email: &str, _username: &str, _role: Role) -> anyhow::Result<()> {
        Ok(())
    }
}
