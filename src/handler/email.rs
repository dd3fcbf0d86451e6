use std::sync::Arc;

use axum::{response::IntoResponse, routing::post, Extension, Json, Router};
use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::emaildtos::{EmailSentResponseDto, SendEmailDto, TestEmailDto},
    error::HttpError,
    service::error::ServiceError,
    AppState,
};

/// Admin-only mail routes; auth and role layers are applied by the router.
pub fn email_handler() -> Router {
    Router::new()
        .route("/send", post(send_email))
        .route("/test/welcome", post(test_welcome))
        .route("/test/verification", post(test_verification))
        .route("/test/password-reset", post(test_password_reset))
        .route("/test/lesson-scheduled", post(test_lesson_scheduled))
}

fn sent(message: &str, id: String) -> Json<EmailSentResponseDto> {
    Json(EmailSentResponseDto {
        status: "success".to_string(),
        message: message.to_string(),
        id,
    })
}

pub async fn send_email(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<SendEmailDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(ServiceError::from)?;

    let id = app_state
        .email_service
        .send(&body.to, &body.subject, &body.html)
        .await
        .map_err(ServiceError::from)?;

    Ok(sent("Email sent", id))
}

pub async fn test_welcome(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<TestEmailDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(ServiceError::from)?;

    let id = app_state
        .email_service
        .send_welcome_email(&body.to, body.display_name())
        .await
        .map_err(ServiceError::from)?;

    Ok(sent("Welcome email sent", id))
}

pub async fn test_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<TestEmailDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(ServiceError::from)?;

    let token = Uuid::new_v4().to_string();
    let id = app_state
        .email_service
        .send_verification_email(&body.to, body.display_name(), &token)
        .await
        .map_err(ServiceError::from)?;

    Ok(sent("Verification email sent", id))
}

pub async fn test_password_reset(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<TestEmailDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(ServiceError::from)?;

    let token = Uuid::new_v4().to_string();
    let id = app_state
        .email_service
        .send_password_reset_email(&body.to, body.display_name(), &token)
        .await
        .map_err(ServiceError::from)?;

    Ok(sent("Password reset email sent", id))
}

pub async fn test_lesson_scheduled(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<TestEmailDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(ServiceError::from)?;

    let id = app_state
        .email_service
        .send_lesson_scheduled_email(
            &body.to,
            body.display_name(),
            "Instrutor Teste",
            Utc::now() + Duration::days(1),
            50,
        )
        .await
        .map_err(ServiceError::from)?;

    Ok(sent("Lesson scheduled email sent", id))
}
