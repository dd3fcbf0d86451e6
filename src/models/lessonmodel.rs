use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    instructormodel::InstructorProfile,
    usermodel::{StudentProfile, User},
};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "lesson_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum LessonStatus {
    Pending,
    Confirmed,
    Completed,
    Canceled,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Lesson {
    pub id: Uuid,
    #[serde(rename = "studentId")]
    pub student_id: Uuid,
    #[serde(rename = "instructorId")]
    pub instructor_id: Uuid,
    #[serde(rename = "scheduledAt")]
    pub scheduled_at: DateTime<Utc>,
    pub duration: i32,
    pub status: LessonStatus,
    pub notes: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone)]
pub struct StudentWithUser {
    #[serde(flatten)]
    pub profile: StudentProfile,
    pub user: Option<User>,
}

#[derive(Debug, Serialize, Clone)]
pub struct InstructorWithUser {
    #[serde(flatten)]
    pub profile: InstructorProfile,
    pub user: Option<User>,
}

/// Lesson with both participants eagerly loaded.
#[derive(Debug, Serialize, Clone)]
pub struct LessonDetails {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub student: Option<StudentWithUser>,
    pub instructor: Option<InstructorWithUser>,
}

pub struct NewLesson {
    pub student_id: Uuid,
    pub instructor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LessonUpdate {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub status: Option<LessonStatus>,
    pub notes: Option<String>,
}

/// Which lessons a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonScope {
    All,
    /// Lessons where the caller is the student or the instructor. With
    /// neither profile nothing matches.
    Participant {
        student_id: Option<Uuid>,
        instructor_id: Option<Uuid>,
    },
}

impl LessonScope {
    pub fn is_empty(&self) -> bool {
        matches!(
            self,
            LessonScope::Participant {
                student_id: None,
                instructor_id: None
            }
        )
    }

    pub fn includes(&self, lesson: &Lesson) -> bool {
        match *self {
            LessonScope::All => true,
            LessonScope::Participant {
                student_id,
                instructor_id,
            } => {
                student_id == Some(lesson.student_id)
                    || instructor_id == Some(lesson.instructor_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(student_id: Uuid, instructor_id: Uuid) -> Lesson {
        Lesson {
            id: Uuid::new_v4(),
            student_id,
            instructor_id,
            scheduled_at: Utc::now(),
            duration: 50,
            status: LessonStatus::Pending,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn participant_scope_matches_either_side_only() {
        let (student, instructor) = (Uuid::new_v4(), Uuid::new_v4());
        let booked = lesson(student, instructor);
        let other = lesson(Uuid::new_v4(), Uuid::new_v4());

        let as_student = LessonScope::Participant {
            student_id: Some(student),
            instructor_id: None,
        };
        let as_instructor = LessonScope::Participant {
            student_id: None,
            instructor_id: Some(instructor),
        };
        assert!(as_student.includes(&booked));
        assert!(as_instructor.includes(&booked));
        assert!(!as_student.includes(&other));
        assert!(LessonScope::All.includes(&other));
    }

    #[test]
    fn scope_without_profiles_matches_nothing() {
        let nobody = LessonScope::Participant {
            student_id: None,
            instructor_id: None,
        };
        assert!(nobody.is_empty());
        assert!(!nobody.includes(&lesson(Uuid::new_v4(), Uuid::new_v4())));
        assert!(!LessonScope::All.is_empty());
    }
}
