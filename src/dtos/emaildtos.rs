use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct SendEmailDto {
    #[validate(email(message = "Recipient email is invalid"))]
    pub to: String,

    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,

    #[validate(length(min = 1, message = "HTML body is required"))]
    pub html: String,
}

/// Body for the template preview endpoints.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct TestEmailDto {
    #[validate(email(message = "Recipient email is invalid"))]
    pub to: String,

    pub name: Option<String>,
}

impl TestEmailDto {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Usuário")
    }
}

#[derive(Debug, Serialize)]
pub struct EmailSentResponseDto {
    pub status: String,
    pub message: String,
    pub id: String,
}
