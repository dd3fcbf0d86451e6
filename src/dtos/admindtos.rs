use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate_reason;
use crate::models::{
    instructormodel::{InstructorDetails, InstructorProfile},
    usermodel::User,
};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RejectInstructorDto {
    #[validate(custom = "validate_reason")]
    pub reason: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApprovalData {
    pub user: User,
    #[serde(rename = "instructorProfile")]
    pub instructor_profile: InstructorProfile,
}

#[derive(Debug, Serialize)]
pub struct ApprovalResponseDto {
    pub status: String,
    pub message: String,
    pub data: ApprovalData,
}

#[derive(Debug, Serialize)]
pub struct RejectionResponseDto {
    pub status: String,
    pub message: String,
    pub data: InstructorProfile,
}

#[derive(Debug, Serialize)]
pub struct ReviewQueueResponseDto {
    pub status: String,
    pub instructors: Vec<InstructorDetails>,
    pub results: usize,
}
