use thiserror::Error;

use crate::{
    db::StoreError,
    error::{ErrorMessage, HttpError},
    mail::sendmail::MailError,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Email delivery failed: {0}")]
    Mail(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Other error: {0}")]
    Other(String),
}

fn capitalize(what: &str) -> String {
    let mut chars = what.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation(constraint) => {
                let message = if constraint.contains("email") {
                    ErrorMessage::EmailExist.to_string()
                } else if constraint.contains("cpf") {
                    ErrorMessage::CpfExist.to_string()
                } else {
                    format!("Duplicate value violates {}", constraint)
                };
                ServiceError::Conflict(message)
            }
            StoreError::InvalidTransition(message) => ServiceError::Conflict(message),
            StoreError::NotFound(what) => ServiceError::NotFound(format!("{} not found", capitalize(what))),
            other => ServiceError::Store(other),
        }
    }
}

impl From<ErrorMessage> for ServiceError {
    fn from(error: ErrorMessage) -> Self {
        match error {
            ErrorMessage::EmptyPassword | ErrorMessage::ExceededMaxPasswordLength(_) => {
                ServiceError::Validation(error.to_string())
            }
            ErrorMessage::WrongCredentials
            | ErrorMessage::InvalidToken
            | ErrorMessage::TokenNotProvided
            | ErrorMessage::UserNoLongerExist
            | ErrorMessage::UserNotAuthenticated => ServiceError::Unauthorized(error.to_string()),
            ErrorMessage::PermissionDenied => ServiceError::Forbidden(error.to_string()),
            ErrorMessage::EmailExist | ErrorMessage::CpfExist => {
                ServiceError::Conflict(error.to_string())
            }
            _ => ServiceError::Other(error.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

impl From<MailError> for ServiceError {
    fn from(error: MailError) -> Self {
        match error {
            MailError::InvalidAddress(_) => ServiceError::Validation(error.to_string()),
            MailError::Provider(message) => ServiceError::Mail(message),
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Validation(_) => HttpError::bad_request(error.to_string()),
            ServiceError::Unauthorized(_) => HttpError::unauthorized(error.to_string()),
            ServiceError::Forbidden(_) => HttpError::forbidden(error.to_string()),
            ServiceError::NotFound(_) => HttpError::not_found(error.to_string()),
            ServiceError::Conflict(_) => HttpError::conflict(error.to_string()),
            ServiceError::Mail(_) => HttpError::bad_gateway(error.to_string()),
            ServiceError::Store(_) | ServiceError::Other(_) => {
                tracing::error!("{}", error);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        }
    }
}
