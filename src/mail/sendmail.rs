use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, Transport,
};
use serde_json::json;
use thiserror::Error;
use validator::validate_email;

use crate::config::{MailConfig, MailTransportKind};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("email provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivers a composed email and returns the provider's message id.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError>;
}

pub fn validate_address(address: &str) -> Result<(), MailError> {
    if validate_email(address.trim()) {
        Ok(())
    } else {
        Err(MailError::InvalidAddress(address.to_string()))
    }
}

pub struct ResendTransport {
    client: reqwest::Client,
    api_key: String,
    from_email: String,
}

impl ResendTransport {
    pub fn new(api_key: String, from_email: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from_email,
        }
    }
}

#[async_trait]
impl EmailTransport for ResendTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        let request_body = json!({
            "from": self.from_email,
            "to": email.to,
            "subject": email.subject,
            "html": email.html,
        });

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| MailError::Provider(format!("Network error: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .unwrap_or_else(|_| "No response body".to_string());

        if !status.is_success() {
            return Err(MailError::Provider(format!(
                "Resend API error ({}): {}",
                status.as_u16(),
                response_text
            )));
        }

        let id = serde_json::from_str::<serde_json::Value>(&response_text)
            .ok()
            .and_then(|body| body.get("id").and_then(|v| v.as_str()).map(str::to_string))
            .unwrap_or_else(|| "success".to_string());

        Ok(id)
    }
}

pub struct SmtpTransport {
    mailer: lettre::SmtpTransport,
    from_email: String,
}

impl SmtpTransport {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());
        let mailer = lettre::SmtpTransport::relay(&config.smtp_host)
            .map_err(|e| MailError::Provider(e.to_string()))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self {
            mailer,
            from_email: config.from_email.clone(),
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        let message = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_email.clone()))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|_| MailError::InvalidAddress(email.to.clone()))?)
            .subject(email.subject.clone())
            .multipart(
                MultiPart::alternative().singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html.clone()),
                ),
            )
            .map_err(|e| MailError::Provider(e.to_string()))?;

        let mailer = self.mailer.clone();
        let response = tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .map_err(|e| MailError::Provider(e.to_string()))?
            .map_err(|e| MailError::Provider(format!("SMTP send failed: {}", e)))?;

        Ok(format!("smtp-{}", response.code()))
    }
}

/// Logs the email instead of delivering it.
pub struct LogTransport;

#[async_trait]
impl EmailTransport for LogTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            bytes = email.html.len(),
            "email delivery skipped, log transport active"
        );
        Ok(format!("log-{}", uuid::Uuid::new_v4()))
    }
}

pub fn transport_from_config(config: &MailConfig) -> Result<Box<dyn EmailTransport>, MailError> {
    match config.transport {
        MailTransportKind::Resend => {
            let api_key = config
                .resend_api_key
                .clone()
                .ok_or_else(|| MailError::Provider("RESEND_API_KEY is not set".to_string()))?;
            Ok(Box::new(ResendTransport::new(api_key, config.from_email.clone())))
        }
        MailTransportKind::Smtp => Ok(Box::new(SmtpTransport::new(config)?)),
        MailTransportKind::Log => Ok(Box::new(LogTransport)),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_validation() {
        assert!(validate_address("test@example.com").is_ok());
        assert!(validate_address("invalid-email").is_err());
        assert!(validate_address("@example.com").is_err());
        assert!(validate_address("a@").is_err());
        assert!(validate_address("a b@example.com").is_err());
        assert!(validate_address("  test@example.com ").is_ok());
    }

    #[tokio::test]
    async fn log_transport_always_succeeds() {
        let email = OutgoingEmail {
            to: "a@x.com".into(),
            subject: "Hi".into(),
            html: "<p>Hi</p>".into(),
        };
        let id = LogTransport.send(&email).await.unwrap();
        assert!(id.starts_with("log-"));
    }
}
