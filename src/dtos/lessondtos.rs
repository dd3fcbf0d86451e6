use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::lessonmodel::{Lesson, LessonDetails, LessonStatus, LessonUpdate};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateLessonDto {
    #[serde(rename = "instructorId")]
    pub instructor_id: Uuid,

    #[serde(rename = "scheduledAt")]
    pub scheduled_at: DateTime<Utc>,

    #[validate(range(min = 15, message = "Lesson must last at least 15 minutes"))]
    pub duration: i32,

    pub notes: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateLessonDto {
    #[serde(rename = "scheduledAt")]
    pub scheduled_at: Option<DateTime<Utc>>,

    #[validate(range(min = 15, message = "Lesson must last at least 15 minutes"))]
    pub duration: Option<i32>,

    pub status: Option<LessonStatus>,

    pub notes: Option<String>,
}

impl From<UpdateLessonDto> for LessonUpdate {
    fn from(dto: UpdateLessonDto) -> Self {
        LessonUpdate {
            scheduled_at: dto.scheduled_at,
            duration: dto.duration,
            status: dto.status,
            notes: dto.notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LessonResponseDto {
    pub status: String,
    pub data: LessonDetails,
}

#[derive(Debug, Serialize)]
pub struct LessonUpdatedResponseDto {
    pub status: String,
    pub data: Lesson,
}

#[derive(Debug, Serialize)]
pub struct LessonListResponseDto {
    pub status: String,
    pub lessons: Vec<LessonDetails>,
    pub results: usize,
}
