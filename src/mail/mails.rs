use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::sendmail::{validate_address, EmailTransport, MailError, OutgoingEmail};

const LAYOUT: &str = include_str!("templates/layout.html");
const WELCOME: &str = include_str!("templates/welcome.html");
const VERIFICATION: &str = include_str!("templates/verification.html");
const PASSWORD_RESET: &str = include_str!("templates/password-reset.html");
const LESSON_SCHEDULED: &str = include_str!("templates/lesson-scheduled.html");

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Fills `{{key}}` placeholders, then wraps the result in the shared layout.
fn render(title: &str, template: &str, placeholders: &[(&str, String)]) -> String {
    let mut content = template.to_string();
    for (key, value) in placeholders {
        content = content.replace(&format!("{{{{{}}}}}", key), value);
    }

    LAYOUT
        .replace("{{title}}", &escape_html(title))
        .replace("{{content}}", &content)
}

pub struct EmailService {
    transport: Arc<dyn EmailTransport>,
    frontend_url: String,
}

impl EmailService {
    pub fn new(transport: Arc<dyn EmailTransport>, frontend_url: impl Into<String>) -> Self {
        Self {
            transport,
            frontend_url: frontend_url.into(),
        }
    }

    fn link(&self, path: &str, token: &str) -> String {
        format!(
            "{}/{}?token={}",
            self.frontend_url,
            path,
            urlencoding::encode(token)
        )
    }

    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<String, MailError> {
        validate_address(to)?;

        let email = OutgoingEmail {
            to: to.trim().to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        };

        match self.transport.send(&email).await {
            Ok(id) => {
                tracing::info!(to = %email.to, id = %id, "email sent");
                Ok(id)
            }
            Err(e) => {
                tracing::error!(to = %email.to, error = %e, "email delivery failed");
                Err(e)
            }
        }
    }

    pub async fn send_welcome_email(&self, to: &str, name: &str) -> Result<String, MailError> {
        let html = render(
            "Bem-vindo",
            WELCOME,
            &[
                ("name", escape_html(name)),
                ("app_url", self.frontend_url.clone()),
            ],
        );
        self.send(to, "Bem-vindo ao SeuInstrutor", &html).await
    }

    pub async fn send_verification_email(
        &self,
        to: &str,
        name: &str,
        token: &str,
    ) -> Result<String, MailError> {
        let html = render(
            "Confirme seu email",
            VERIFICATION,
            &[
                ("name", escape_html(name)),
                ("verification_link", self.link("verify-email", token)),
            ],
        );
        self.send(to, "Confirme seu email", &html).await
    }

    pub async fn send_password_reset_email(
        &self,
        to: &str,
        name: &str,
        token: &str,
    ) -> Result<String, MailError> {
        let html = render(
            "Redefinição de senha",
            PASSWORD_RESET,
            &[
                ("name", escape_html(name)),
                ("reset_link", self.link("reset-password", token)),
            ],
        );
        self.send(to, "Redefinição de senha", &html).await
    }

    pub async fn send_lesson_scheduled_email(
        &self,
        to: &str,
        name: &str,
        instructor_name: &str,
        scheduled_at: DateTime<Utc>,
        duration: i32,
    ) -> Result<String, MailError> {
        let html = render(
            "Aula agendada",
            LESSON_SCHEDULED,
            &[
                ("name", escape_html(name)),
                ("instructor_name", escape_html(instructor_name)),
                (
                    "scheduled_at",
                    scheduled_at.format("%d/%m/%Y %H:%M UTC").to_string(),
                ),
                ("duration", duration.to_string()),
                ("app_url", format!("{}/lessons", self.frontend_url)),
            ],
        );
        self.send(to, "Sua aula foi agendada", &html).await
    }
}
