use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{validate_cpf, validate_name};
use crate::models::usermodel::{NewStudentProfile, UserWithProfiles};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(
        length(max = 255, message = "Name must be at most 255 characters"),
        custom = "validate_name"
    )]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        length(max = 255, message = "Email must be at most 255 characters"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,

    #[validate(
        length(max = 20, message = "CPF must be at most 20 characters"),
        custom = "validate_cpf"
    )]
    pub cpf: String,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,
}

impl RegisterUserDto {
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    pub fn student_profile(&self) -> NewStudentProfile {
        NewStudentProfile {
            cpf: self.cpf.trim().to_string(),
            phone: self.phone.clone(),
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
    pub user: UserWithProfiles,
}

#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: UserWithProfiles,
}

#[derive(Debug, Serialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}
