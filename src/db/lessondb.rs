use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    db::{DBClient, INSTRUCTOR_COLUMNS, LESSON_COLUMNS, STUDENT_COLUMNS, USER_COLUMNS},
    StoreError,
};
use crate::models::{
    instructormodel::InstructorProfile,
    lessonmodel::{
        InstructorWithUser, Lesson, LessonDetails, LessonScope, LessonUpdate, NewLesson,
        StudentWithUser,
    },
    usermodel::{StudentProfile, User},
};

#[async_trait]
pub trait LessonExt {
    async fn save_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError>;

    async fn get_lesson(&self, lesson_id: Uuid) -> Result<Option<LessonDetails>, StoreError>;

    /// Lessons visible to `scope`, earliest scheduled first.
    async fn list_lessons(&self, scope: &LessonScope) -> Result<Vec<LessonDetails>, StoreError>;

    async fn update_lesson(
        &self,
        lesson_id: Uuid,
        update: LessonUpdate,
    ) -> Result<Option<Lesson>, StoreError>;

    async fn delete_lesson(&self, lesson_id: Uuid) -> Result<bool, StoreError>;
}

impl DBClient {
    async fn attach_participants(
        &self,
        lessons: Vec<Lesson>,
    ) -> Result<Vec<LessonDetails>, StoreError> {
        if lessons.is_empty() {
            return Ok(Vec::new());
        }

        let student_ids: Vec<Uuid> = lessons.iter().map(|l| l.student_id).collect();
        let instructor_ids: Vec<Uuid> = lessons.iter().map(|l| l.instructor_id).collect();

        let students = sqlx::query_as::<_, StudentProfile>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM student_profiles WHERE id = ANY($1)"
        ))
        .bind(&student_ids)
        .fetch_all(&self.pool)
        .await?;

        let instructors = sqlx::query_as::<_, InstructorProfile>(&format!(
            "SELECT {INSTRUCTOR_COLUMNS} FROM instructor_profiles WHERE id = ANY($1)"
        ))
        .bind(&instructor_ids)
        .fetch_all(&self.pool)
        .await?;

        let user_ids: Vec<Uuid> = students
            .iter()
            .map(|s| s.user_id)
            .chain(instructors.iter().map(|i| i.user_id))
            .collect();

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(&user_ids)
        .fetch_all(&self.pool)
        .await?;

        let users: HashMap<Uuid, User> = users.into_iter().map(|u| (u.id, u)).collect();
        let students: HashMap<Uuid, StudentProfile> =
            students.into_iter().map(|s| (s.id, s)).collect();
        let instructors: HashMap<Uuid, InstructorProfile> =
            instructors.into_iter().map(|i| (i.id, i)).collect();

        Ok(lessons
            .into_iter()
            .map(|lesson| LessonDetails {
                student: students.get(&lesson.student_id).map(|s| StudentWithUser {
                    user: users.get(&s.user_id).cloned(),
                    profile: s.clone(),
                }),
                instructor: instructors
                    .get(&lesson.instructor_id)
                    .map(|i| InstructorWithUser {
                        user: users.get(&i.user_id).cloned(),
                        profile: i.clone(),
                    }),
                lesson,
            })
            .collect())
    }
}

#[async_trait]
impl LessonExt for DBClient {
    async fn save_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            r#"
            INSERT INTO lessons (student_id, instructor_id, scheduled_at, duration, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LESSON_COLUMNS}
            "#
        ))
        .bind(lesson.student_id)
        .bind(lesson.instructor_id)
        .bind(lesson.scheduled_at)
        .bind(lesson.duration)
        .bind(lesson.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(lesson)
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> Result<Option<LessonDetails>, StoreError> {
        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1"
        ))
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;

        match lesson {
            Some(lesson) => Ok(self.attach_participants(vec![lesson]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_lessons(&self, scope: &LessonScope) -> Result<Vec<LessonDetails>, StoreError> {
        if scope.is_empty() {
            return Ok(Vec::new());
        }

        let lessons = match *scope {
            LessonScope::All => {
                sqlx::query_as::<_, Lesson>(&format!(
                    "SELECT {LESSON_COLUMNS} FROM lessons ORDER BY scheduled_at ASC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            LessonScope::Participant {
                student_id,
                instructor_id,
            } => {
                sqlx::query_as::<_, Lesson>(&format!(
                    r#"
                    SELECT {LESSON_COLUMNS} FROM lessons
                    WHERE student_id = $1 OR instructor_id = $2
                    ORDER BY scheduled_at ASC
                    "#
                ))
                .bind(student_id)
                .bind(instructor_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        self.attach_participants(lessons).await
    }

    async fn update_lesson(
        &self,
        lesson_id: Uuid,
        update: LessonUpdate,
    ) -> Result<Option<Lesson>, StoreError> {
        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            r#"
            UPDATE lessons SET
                scheduled_at = COALESCE($2, scheduled_at),
                duration = COALESCE($3, duration),
                status = COALESCE($4, status),
                notes = COALESCE($5, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LESSON_COLUMNS}
            "#
        ))
        .bind(lesson_id)
        .bind(update.scheduled_at)
        .bind(update.duration)
        .bind(update.status)
        .bind(update.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lesson)
    }

    async fn delete_lesson(&self, lesson_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(lesson_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
