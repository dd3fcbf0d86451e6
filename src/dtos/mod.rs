pub mod admindtos;
pub mod emaildtos;
pub mod instructordtos;
pub mod lessondtos;
pub mod userdtos;

use validator::ValidationError;

fn blank(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("blank");
    error.message = Some(message.into());
    error
}

/// Whitespace-only names are rejected before they reach the store.
pub fn validate_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(blank("Name is required"));
    }
    Ok(())
}

pub fn validate_cpf(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(blank("CPF is required"));
    }
    Ok(())
}

pub fn validate_reason(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(blank("Rejection reason is required"));
    }
    Ok(())
}
