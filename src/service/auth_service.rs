use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AdminBootstrap,
    db::{InstructorExt, Store, UserExt},
    dtos::userdtos::{LoginUserDto, RegisterUserDto},
    error::ErrorMessage,
    models::{
        instructormodel::VerificationStatus,
        usermodel::{NewUser, User, UserRole, UserWithProfiles},
    },
    service::error::ServiceError,
    utils::{password, token},
};

/// A freshly issued token together with the profile it was issued for.
#[derive(Debug)]
pub struct AuthSession {
    pub token: String,
    pub user: UserWithProfiles,
}

pub struct AuthService {
    db_client: Arc<dyn Store>,
    jwt_secret: String,
    jwt_maxage: i64,
}

impl AuthService {
    pub fn new(db_client: Arc<dyn Store>, jwt_secret: String, jwt_maxage: i64) -> Self {
        Self {
            db_client,
            jwt_secret,
            jwt_maxage,
        }
    }

    pub fn jwt_maxage(&self) -> i64 {
        self.jwt_maxage
    }

    fn issue_token(&self, user: &User) -> Result<String, ServiceError> {
        token::create_token(
            &user.id.to_string(),
            &user.email,
            user.role,
            self.jwt_secret.as_bytes(),
            self.jwt_maxage,
        )
        .map_err(|e| ServiceError::Other(e.to_string()))
    }

    async fn load_profiles(&self, user_id: Uuid) -> Result<UserWithProfiles, ServiceError> {
        self.db_client
            .get_user_with_profiles(user_id)
            .await?
            .ok_or_else(|| ErrorMessage::UserNoLongerExist.into())
    }

    pub async fn register(&self, mut body: RegisterUserDto) -> Result<AuthSession, ServiceError> {
        body.email = body.normalized_email();
        body.validate()?;

        let email = body.email.clone();
        let profile = body.student_profile();

        if self.db_client.get_user(None, Some(&email)).await?.is_some() {
            tracing::warn!(email = %email, "registration rejected, email taken");
            return Err(ErrorMessage::EmailExist.into());
        }
        if self
            .db_client
            .get_student_profile_by_cpf(&profile.cpf)
            .await?
            .is_some()
        {
            tracing::warn!(email = %email, "registration rejected, cpf taken");
            return Err(ErrorMessage::CpfExist.into());
        }

        let password_hash = password::hash(&body.password)?;

        let (user, _) = self
            .db_client
            .save_student(
                NewUser {
                    email,
                    password_hash,
                    name: body.name.trim().to_string(),
                    role: UserRole::Student,
                },
                profile,
            )
            .await?;

        tracing::info!(user_id = %user.id, "student registered");

        let token = self.issue_token(&user)?;
        let user = self.load_profiles(user.id).await?;

        Ok(AuthSession { token, user })
    }

    pub async fn login(&self, mut body: LoginUserDto) -> Result<AuthSession, ServiceError> {
        body.email = body.email.trim().to_lowercase();
        body.validate()?;

        let email = body.email.clone();
        let user = self
            .db_client
            .get_user(None, Some(&email))
            .await?
            .ok_or(ErrorMessage::WrongCredentials)?;

        if !password::compare(&body.password, &user.password)? {
            tracing::warn!(user_id = %user.id, "login rejected, wrong password");
            return Err(ErrorMessage::WrongCredentials.into());
        }

        if user.role == UserRole::Instructor {
            let profile = self.db_client.get_instructor_profile(user.id).await?;
            match profile.map(|p| (p.verification_status, p.rejection_reason)) {
                Some((VerificationStatus::Approved, _)) => {}
                Some((VerificationStatus::Pending, _)) => {
                    tracing::warn!(user_id = %user.id, "login blocked, instructor pending");
                    return Err(ServiceError::Forbidden(
                        "Your instructor account is awaiting approval".to_string(),
                    ));
                }
                Some((VerificationStatus::Rejected, reason)) => {
                    tracing::warn!(user_id = %user.id, "login blocked, instructor rejected");
                    return Err(ServiceError::Forbidden(format!(
                        "Your instructor registration was rejected: {}",
                        reason.unwrap_or_else(|| "no reason given".to_string())
                    )));
                }
                None => {
                    tracing::warn!(user_id = %user.id, "login blocked, instructor profile missing");
                    return Err(ServiceError::Forbidden(
                        "Instructor profile not found for this account".to_string(),
                    ));
                }
            }
        }

        let token = self.issue_token(&user)?;
        let user = self.load_profiles(user.id).await?;

        Ok(AuthSession { token, user })
    }

    pub async fn get_me(&self, user_id: Uuid) -> Result<UserWithProfiles, ServiceError> {
        self.load_profiles(user_id).await
    }

    /// Creates the configured admin account unless its email is already taken.
    pub async fn ensure_admin(
        &self,
        admin: &AdminBootstrap,
    ) -> Result<Option<User>, ServiceError> {
        if self
            .db_client
            .get_user(None, Some(&admin.email))
            .await?
            .is_some()
        {
            return Ok(None);
        }

        let password_hash = password::hash(&admin.password)?;
        let user = self
            .db_client
            .save_user(NewUser {
                email: admin.email.clone(),
                password_hash,
                name: admin.name.clone(),
                role: UserRole::Admin,
            })
            .await?;

        tracing::info!(user_id = %user.id, "bootstrap admin created");
        Ok(Some(user))
    }
}
