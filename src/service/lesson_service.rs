use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{InstructorExt, LessonExt, Store, UserExt},
    dtos::lessondtos::{CreateLessonDto, UpdateLessonDto},
    models::{
        instructormodel::VerificationStatus,
        lessonmodel::{Lesson, LessonDetails, LessonScope, NewLesson},
        usermodel::{User, UserRole},
    },
    service::error::ServiceError,
};

pub struct LessonService {
    db_client: Arc<dyn Store>,
}

impl LessonService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    /// Profiles the caller can act through. ADMIN is unrestricted.
    async fn scope_for(&self, caller: &User) -> Result<LessonScope, ServiceError> {
        if caller.role == UserRole::Admin {
            return Ok(LessonScope::All);
        }

        let student_id = self
            .db_client
            .get_student_profile(caller.id)
            .await?
            .map(|p| p.id);
        let instructor_id = self
            .db_client
            .get_instructor_profile(caller.id)
            .await?
            .map(|p| p.id);

        Ok(LessonScope::Participant {
            student_id,
            instructor_id,
        })
    }

    async fn accessible_lesson(
        &self,
        caller: &User,
        lesson_id: Uuid,
    ) -> Result<LessonDetails, ServiceError> {
        let lesson = self
            .db_client
            .get_lesson(lesson_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Lesson not found".to_string()))?;

        let scope = self.scope_for(caller).await?;
        if !scope.includes(&lesson.lesson) {
            tracing::warn!(user_id = %caller.id, lesson_id = %lesson_id, "lesson access denied");
            return Err(ServiceError::Forbidden(
                "You do not have access to this lesson".to_string(),
            ));
        }

        Ok(lesson)
    }

    pub async fn create(
        &self,
        caller: &User,
        body: CreateLessonDto,
    ) -> Result<LessonDetails, ServiceError> {
        body.validate()?;

        let student = self
            .db_client
            .get_student_profile(caller.id)
            .await?
            .ok_or_else(|| {
                ServiceError::Forbidden("Only students can schedule lessons".to_string())
            })?;

        let instructor = self
            .db_client
            .get_instructor(body.instructor_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Instructor not found".to_string()))?;

        if instructor.profile.verification_status != VerificationStatus::Approved {
            return Err(ServiceError::Validation(
                "Instructor is not approved to give lessons".to_string(),
            ));
        }

        let lesson = self
            .db_client
            .save_lesson(NewLesson {
                student_id: student.id,
                instructor_id: instructor.profile.id,
                scheduled_at: body.scheduled_at,
                duration: body.duration,
                notes: body.notes,
            })
            .await?;

        tracing::info!(
            lesson_id = %lesson.id,
            student_id = %student.id,
            instructor_id = %instructor.profile.id,
            "lesson scheduled"
        );

        self.db_client
            .get_lesson(lesson.id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Lesson not found".to_string()))
    }

    pub async fn find_all(&self, caller: &User) -> Result<Vec<LessonDetails>, ServiceError> {
        let scope = self.scope_for(caller).await?;
        Ok(self.db_client.list_lessons(&scope).await?)
    }

    pub async fn find_one(
        &self,
        caller: &User,
        lesson_id: Uuid,
    ) -> Result<LessonDetails, ServiceError> {
        self.accessible_lesson(caller, lesson_id).await
    }

    pub async fn update(
        &self,
        caller: &User,
        lesson_id: Uuid,
        body: UpdateLessonDto,
    ) -> Result<Lesson, ServiceError> {
        body.validate()?;
        self.accessible_lesson(caller, lesson_id).await?;

        let lesson = self
            .db_client
            .update_lesson(lesson_id, body.into())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Lesson not found".to_string()))?;

        tracing::info!(lesson_id = %lesson.id, status = ?lesson.status, "lesson updated");
        Ok(lesson)
    }

    pub async fn remove(&self, caller: &User, lesson_id: Uuid) -> Result<(), ServiceError> {
        self.accessible_lesson(caller, lesson_id).await?;

        if !self.db_client.delete_lesson(lesson_id).await? {
            return Err(ServiceError::NotFound("Lesson not found".to_string()));
        }

        tracing::info!(lesson_id = %lesson_id, "lesson removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{
        db::MemoryStore,
        dtos::{instructordtos::CreateInstructorDto, userdtos::RegisterUserDto},
        models::{instructormodel::NewInstructorProfile, lessonmodel::LessonStatus, usermodel::NewUser},
        service::{auth_service::AuthService, instructor_service::InstructorService},
    };

    struct Harness {
        store: Arc<MemoryStore>,
        lessons: LessonService,
        student: User,
        instructor: User,
        instructor_profile_id: Uuid,
    }

    async fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(store.clone(), "secret".into(), 60);
        let instructors = InstructorService::new(store.clone(), Some("instrutor123".into()));

        let student = auth
            .register(RegisterUserDto {
                name: "Aluno".into(),
                email: "aluno@x.com".into(),
                password: "secret123".into(),
                cpf: "100".into(),
                phone: None,
            })
            .await
            .unwrap()
            .user
            .user;

        let details = instructors
            .create(CreateInstructorDto {
                name: "Carlos".into(),
                email: "carlos@x.com".into(),
                password: None,
                cpf: "200".into(),
                credential_number: None,
                phone: None,
                price_per_hour: 90.0,
                categories: vec!["B".into()],
                bio: None,
                address: None,
                latitude: None,
                longitude: None,
                vehicles: vec![],
            })
            .await
            .unwrap();

        Harness {
            lessons: LessonService::new(store.clone()),
            store,
            student,
            instructor: details.user.unwrap(),
            instructor_profile_id: details.profile.id,
        }
    }

    fn lesson_dto(instructor_id: Uuid, days: i64) -> CreateLessonDto {
        CreateLessonDto {
            instructor_id,
            scheduled_at: Utc::now() + Duration::days(days),
            duration: 50,
            notes: Some("Baliza".into()),
        }
    }

    async fn user_with_role(store: &MemoryStore, email: &str, role: UserRole) -> User {
        store
            .save_user(NewUser {
                email: email.into(),
                password_hash: "hash".into(),
                name: "Other".into(),
                role,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn student_schedules_pending_lesson() {
        let h = harness().await;
        let details = h
            .lessons
            .create(&h.student, lesson_dto(h.instructor_profile_id, 1))
            .await
            .unwrap();

        assert_eq!(details.lesson.status, LessonStatus::Pending);
        assert_eq!(details.student.unwrap().user.unwrap().id, h.student.id);
        assert_eq!(details.instructor.unwrap().user.unwrap().id, h.instructor.id);
    }

    #[tokio::test]
    async fn create_requires_student_profile_and_approved_instructor() {
        let h = harness().await;

        let err = h
            .lessons
            .create(&h.instructor, lesson_dto(h.instructor_profile_id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = h
            .lessons
            .create(&h.student, lesson_dto(Uuid::new_v4(), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let applicant = user_with_role(&h.store, "p@x.com", UserRole::Student).await;
        let pending = h
            .store
            .upsert_verification_request(
                applicant.id,
                NewInstructorProfile {
                    cpf: "300".into(),
                    credential_number: None,
                    phone: None,
                    price_per_hour: Default::default(),
                    categories: vec!["B".into()],
                    bio: None,
                    address: None,
                    latitude: None,
                    longitude: None,
                    verification_status: VerificationStatus::Pending,
                },
                None,
            )
            .await
            .unwrap();
        let err = h
            .lessons
            .create(&h.student, lesson_dto(pending.profile.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let mut short = lesson_dto(h.instructor_profile_id, 1);
        short.duration = 10;
        let err = h.lessons.create(&h.student, short).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn listings_are_scoped_by_participation() {
        let h = harness().await;
        h.lessons.create(&h.student, lesson_dto(h.instructor_profile_id, 3)).await.unwrap();
        h.lessons.create(&h.student, lesson_dto(h.instructor_profile_id, 1)).await.unwrap();

        let mine = h.lessons.find_all(&h.student).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine[0].lesson.scheduled_at < mine[1].lesson.scheduled_at);

        assert_eq!(h.lessons.find_all(&h.instructor).await.unwrap().len(), 2);

        let stranger = user_with_role(&h.store, "z@x.com", UserRole::Student).await;
        assert!(h.lessons.find_all(&stranger).await.unwrap().is_empty());

        let admin = user_with_role(&h.store, "admin@x.com", UserRole::Admin).await;
        assert_eq!(h.lessons.find_all(&admin).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn non_participants_are_forbidden() {
        let h = harness().await;
        let lesson = h
            .lessons
            .create(&h.student, lesson_dto(h.instructor_profile_id, 1))
            .await
            .unwrap();
        let id = lesson.lesson.id;

        let stranger = user_with_role(&h.store, "z@x.com", UserRole::Student).await;
        let err = h.lessons.find_one(&stranger, id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = h.lessons.remove(&stranger, id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = h.lessons.find_one(&h.student, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn participants_update_and_admin_removes() {
        let h = harness().await;
        let lesson = h
            .lessons
            .create(&h.student, lesson_dto(h.instructor_profile_id, 1))
            .await
            .unwrap();
        let id = lesson.lesson.id;

        let updated = h
            .lessons
            .update(
                &h.instructor,
                id,
                UpdateLessonDto {
                    status: Some(LessonStatus::Confirmed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, LessonStatus::Confirmed);
        assert_eq!(updated.duration, 50);

        let admin = user_with_role(&h.store, "admin@x.com", UserRole::Admin).await;
        h.lessons.remove(&admin, id).await.unwrap();
        let err = h.lessons.find_one(&h.student, id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
