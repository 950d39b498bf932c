use async_trait::async_trait;
use tracing::info;

use crate::profile::dto::ProfileResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> anyhow::Result<()>;
}

/// Emits outgoing mail as structured log events instead of delivering it.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> anyhow::Result<()> {
        info!(
            from = %mail.from,
            to = %mail.to,
            subject = %mail.subject,
            bytes = mail.text.len(),
            "mail sent"
        );
        Ok(())
    }
}

pub fn welcome_mail(from: &str, profile: &ProfileResponse) -> Mail {
    Mail {
        from: from.to_string(),
        to: profile.email.clone(),
        subject: "Welcome to TriagentDesk".into(),
        text: format!(
            "Hi {},\n\nYour TriagentDesk account has been created for {}.\n\
             Verify your email address to unlock ticket notifications.\n",
            profile.name, profile.email
        ),
    }
}

pub async fn send_welcome(
    mailer: &dyn Mailer,
    from: &str,
    profile: &ProfileResponse,
) -> anyhow::Result<()> {
    mailer.send(welcome_mail(from, profile)).await
}
