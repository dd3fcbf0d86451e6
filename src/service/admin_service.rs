use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{InstructorExt, Store, UserExt},
    dtos::admindtos::RejectInstructorDto,
    models::{
        instructormodel::{InstructorDetails, InstructorOrder, InstructorProfile, VerificationStatus},
        usermodel::User,
    },
    service::error::ServiceError,
};

pub struct AdminService {
    db_client: Arc<dyn Store>,
}

impl AdminService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    /// Loads the applicant's profile and checks the review transition is legal.
    async fn reviewable_profile(
        &self,
        user_id: Uuid,
        next: VerificationStatus,
    ) -> Result<InstructorProfile, ServiceError> {
        self.db_client
            .get_user(Some(user_id), None)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let profile = self
            .db_client
            .get_instructor_profile(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Instructor profile not found".to_string()))?;

        if !profile.verification_status.can_review_to(next) {
            tracing::warn!(
                user_id = %user_id,
                current = profile.verification_status.to_str(),
                requested = next.to_str(),
                "illegal verification transition"
            );
            return Err(ServiceError::Conflict(
                profile.verification_status.transition_error(next),
            ));
        }

        Ok(profile)
    }

    pub async fn approve_instructor(
        &self,
        user_id: Uuid,
    ) -> Result<(User, InstructorProfile), ServiceError> {
        self.reviewable_profile(user_id, VerificationStatus::Approved)
            .await?;

        let (user, profile) = self.db_client.approve_instructor(user_id).await?;

        tracing::info!(
            user_id = %user.id,
            instructor_id = %profile.id,
            "instructor approved"
        );

        Ok((user, profile))
    }

    pub async fn reject_instructor(
        &self,
        user_id: Uuid,
        body: RejectInstructorDto,
    ) -> Result<InstructorProfile, ServiceError> {
        body.validate()?;

        self.reviewable_profile(user_id, VerificationStatus::Rejected)
            .await?;

        let notes = body
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let profile = self
            .db_client
            .reject_instructor(user_id, body.reason.trim(), notes)
            .await?;

        tracing::info!(user_id = %user_id, instructor_id = %profile.id, "instructor rejected");

        Ok(profile)
    }

    pub async fn list_pending_instructors(&self) -> Result<Vec<InstructorDetails>, ServiceError> {
        Ok(self
            .db_client
            .list_instructors_by_status(VerificationStatus::Pending, InstructorOrder::CreatedDesc)
            .await?)
    }

    pub async fn list_rejected_instructors(&self) -> Result<Vec<InstructorDetails>, ServiceError> {
        Ok(self
            .db_client
            .list_instructors_by_status(VerificationStatus::Rejected, InstructorOrder::UpdatedDesc)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{memory::WritePoint, MemoryStore},
        dtos::{
            instructordtos::RequestVerificationDto,
            userdtos::{LoginUserDto, RegisterUserDto},
        },
        models::usermodel::UserRole,
        service::{auth_service::AuthService, instructor_service::InstructorService},
    };

    struct Harness {
        store: Arc<MemoryStore>,
        auth: AuthService,
        instructors: InstructorService,
        admin: AdminService,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        Harness {
            auth: AuthService::new(store.clone(), "secret".into(), 60),
            instructors: InstructorService::new(store.clone(), None),
            admin: AdminService::new(store.clone()),
            store,
        }
    }

    fn request(cpf: &str) -> RequestVerificationDto {
        RequestVerificationDto {
            cpf: cpf.into(),
            credential_number: Some("DETRAN-123".into()),
            phone: None,
            price_per_hour: 80.0,
            categories: vec!["B".into()],
            bio: None,
            address: None,
            latitude: None,
            longitude: None,
            vehicles: None,
        }
    }

    fn reject(reason: &str) -> RejectInstructorDto {
        RejectInstructorDto {
            reason: reason.into(),
            notes: None,
        }
    }

    async fn applicant(h: &Harness, email: &str, cpf: &str) -> Uuid {
        let session = h
            .auth
            .register(RegisterUserDto {
                name: "Applicant".into(),
                email: email.into(),
                password: "secret123".into(),
                cpf: cpf.into(),
                phone: None,
            })
            .await
            .unwrap();
        let user_id = session.user.user.id;
        h.instructors.request_verification(user_id, request(cpf)).await.unwrap();
        user_id
    }

    #[tokio::test]
    async fn approve_promotes_role_and_clears_rejection() {
        let h = harness();
        let user_id = applicant(&h, "a@x.com", "111").await;

        let (user, profile) = h.admin.approve_instructor(user_id).await.unwrap();
        assert_eq!(user.role, UserRole::Instructor);
        assert_eq!(profile.verification_status, VerificationStatus::Approved);
        assert!(profile.rejection_reason.is_none());
    }

    #[tokio::test]
    async fn approve_rolls_back_when_role_update_fails() {
        let h = harness();
        let user_id = applicant(&h, "a@x.com", "111").await;

        h.store.inject_fault(WritePoint::UpdateUserRole).await;
        let err = h.admin.approve_instructor(user_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));

        let profile = h.store.get_instructor_profile(user_id).await.unwrap().unwrap();
        assert_eq!(profile.verification_status, VerificationStatus::Pending);
        let user = h.store.get_user(Some(user_id), None).await.unwrap().unwrap();
        assert_eq!(user.role, UserRole::Student);
    }

    #[tokio::test]
    async fn only_pending_profiles_can_be_reviewed() {
        let h = harness();
        let user_id = applicant(&h, "a@x.com", "111").await;
        h.admin.reject_instructor(user_id, reject("docs illegible")).await.unwrap();

        let err = h.admin.approve_instructor(user_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m.contains("REJECTED")));

        let err = h.admin.reject_instructor(user_id, reject("again")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn concurrent_approve_and_reject_settle_on_one_decision() {
        let h = harness();
        let user_id = applicant(&h, "a@x.com", "111").await;

        let (approved, rejected) = tokio::join!(
            h.admin.approve_instructor(user_id),
            h.admin.reject_instructor(user_id, reject("docs illegible")),
        );
        assert!(approved.is_ok() != rejected.is_ok());

        let profile = h.store.get_instructor_profile(user_id).await.unwrap().unwrap();
        let user = h.store.get_user(Some(user_id), None).await.unwrap().unwrap();
        match approved {
            Ok(_) => {
                assert!(matches!(rejected, Err(ServiceError::Conflict(_))));
                assert_eq!(profile.verification_status, VerificationStatus::Approved);
                assert_eq!(user.role, UserRole::Instructor);
            }
            Err(err) => {
                assert!(matches!(err, ServiceError::Conflict(_)));
                assert_eq!(profile.verification_status, VerificationStatus::Rejected);
                assert_eq!(user.role, UserRole::Student);
            }
        }
    }

    #[tokio::test]
    async fn missing_user_or_profile_is_not_found() {
        let h = harness();
        let err = h.admin.approve_instructor(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let session = h
            .auth
            .register(RegisterUserDto {
                name: "Plain".into(),
                email: "p@x.com".into(),
                password: "secret123".into(),
                cpf: "999".into(),
                phone: None,
            })
            .await
            .unwrap();
        let err = h.admin.approve_instructor(session.user.user.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m.contains("Instructor profile")));
    }

    #[tokio::test]
    async fn reject_requires_reason_and_keeps_role() {
        let h = harness();
        let user_id = applicant(&h, "a@x.com", "111").await;

        let err = h.admin.reject_instructor(user_id, reject("  ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let profile = h
            .admin
            .reject_instructor(
                user_id,
                RejectInstructorDto {
                    reason: "docs illegible".into(),
                    notes: Some("scan again".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.verification_status, VerificationStatus::Rejected);
        assert_eq!(profile.rejection_notes.as_deref(), Some("scan again"));

        let user = h.store.get_user(Some(user_id), None).await.unwrap().unwrap();
        assert_eq!(user.role, UserRole::Student);
    }

    #[tokio::test]
    async fn review_queues_are_ordered() {
        let h = harness();
        let first = applicant(&h, "a@x.com", "1").await;
        let second = applicant(&h, "b@x.com", "2").await;

        let pending = h.admin.list_pending_instructors().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].profile.user_id, second);

        h.admin.reject_instructor(second, reject("no")).await.unwrap();
        h.admin.reject_instructor(first, reject("no")).await.unwrap();
        let rejected = h.admin.list_rejected_instructors().await.unwrap();
        assert_eq!(rejected[0].profile.user_id, first);
        assert!(h.admin.list_pending_instructors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_applicant_resubmits_and_gets_approved() {
        let h = harness();
        let user_id = applicant(&h, "a@x.com", "111").await;

        h.admin.reject_instructor(user_id, reject("docs illegible")).await.unwrap();
        let rejected = h.admin.list_rejected_instructors().await.unwrap();
        assert_eq!(rejected[0].profile.rejection_reason.as_deref(), Some("docs illegible"));

        let resubmitted = h.instructors.request_verification(user_id, request("111")).await.unwrap();
        assert_eq!(resubmitted.profile.verification_status, VerificationStatus::Pending);
        assert!(resubmitted.profile.rejection_reason.is_none());

        let (user, _) = h.admin.approve_instructor(user_id).await.unwrap();
        assert_eq!(user.role, UserRole::Instructor);

        let session = h
            .auth
            .login(LoginUserDto {
                email: "a@x.com".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap();
        assert_eq!(session.user.user.role, UserRole::Instructor);
        assert_eq!(
            session.user.instructor_profile.unwrap().profile.verification_status,
            VerificationStatus::Approved
        );
    }
}
