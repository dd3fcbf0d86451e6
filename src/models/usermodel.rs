use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::instructormodel::InstructorDetails;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Student,
    Instructor,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Student => "STUDENT",
            UserRole::Instructor => "INSTRUCTOR",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub role: UserRole,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct StudentProfile {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub cpf: String,
    pub phone: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// A user together with whichever profiles it owns.
#[derive(Debug, Serialize, Clone)]
pub struct UserWithProfiles {
    #[serde(flatten)]
    pub user: User,
    #[serde(rename = "studentProfile")]
    pub student_profile: Option<StudentProfile>,
    #[serde(rename = "instructorProfile")]
    pub instructor_profile: Option<InstructorDetails>,
}

pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
}

pub struct NewStudentProfile {
    pub cpf: String,
    pub phone: Option<String>,
}
