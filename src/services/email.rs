//! Email delivery for finished onboarding questionnaires
//!
//! The `Mailer` trait is the seam the finalize pipeline depends on; the SMTP
//! transport lives behind it so tests can swap in a recorder.

use crate::config::SmtpConfig;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Outbound mail delivery
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send the generated proposal to the company contact address.
    async fn send_proposal(&self, to_email: &str, company_name: &str, proposal: &str)
        -> Result<()>;
}

/// SMTP-backed mailer using the configured relay
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_proposal(
        &self,
        to_email: &str,
        company_name: &str,
        proposal: &str,
    ) -> Result<()> {
        if self.config.host.is_empty() {
            return Err(anyhow!("SMTP host not configured"));
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from);
        let subject = format!("Propuesta de alta para {}", company_name);
        let body = format!(
            "Hola,\n\nHemos completado la evaluación de {} y adjuntamos la propuesta generada:\n\n{}\n\nUn saludo,\nEquipo de {}",
            company_name, proposal, self.config.from_name
        );

        let email = Message::builder()
            .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .to(to_email.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
                .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
                .credentials(creds)
                .port(self.config.port)
                .build();

        mailer
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: String::new(),
            port: 587,
            username: "user".to_string(),
            password: "pass".to_string(),
            from: "alta@example.com".to_string(),
            from_name: "Alta".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_host_fails_before_connecting() {
        let mailer = SmtpMailer::new(config());
        let err = mailer
            .send_proposal("info@acme.example", "Acme", "propuesta")
            .await
            .expect_err("empty host must fail");
        assert!(err.to_string().contains("SMTP host"));
    }
}
