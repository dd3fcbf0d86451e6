use async_trait::async_trait;
use uuid::Uuid;

use super::{
    db::{DBClient, STUDENT_COLUMNS, USER_COLUMNS},
    instructordb::InstructorExt,
    StoreError,
};
use crate::models::usermodel::{NewStudentProfile, NewUser, StudentProfile, User, UserWithProfiles};

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError>;

    async fn get_user_with_profiles(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserWithProfiles>, StoreError>;

    async fn get_student_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<StudentProfile>, StoreError>;

    async fn get_student_profile_by_cpf(
        &self,
        cpf: &str,
    ) -> Result<Option<StudentProfile>, StoreError>;

    async fn save_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Creates the user and its student profile in one transaction.
    async fn save_student(
        &self,
        user: NewUser,
        profile: NewStudentProfile,
    ) -> Result<(User, StudentProfile), StoreError>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn get_user_with_profiles(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserWithProfiles>, StoreError> {
        let Some(user) = self.get_user(Some(user_id), None).await? else {
            return Ok(None);
        };

        let student_profile = self.get_student_profile(user_id).await?;
        let instructor_profile = self.get_instructor_by_user(user_id).await?;

        Ok(Some(UserWithProfiles {
            user,
            student_profile,
            instructor_profile,
        }))
    }

    async fn get_student_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<StudentProfile>, StoreError> {
        let profile = sqlx::query_as::<_, StudentProfile>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM student_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn get_student_profile_by_cpf(
        &self,
        cpf: &str,
    ) -> Result<Option<StudentProfile>, StoreError> {
        let profile = sqlx::query_as::<_, StudentProfile>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM student_profiles WHERE cpf = $1"
        ))
        .bind(cpf)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn save_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.name)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn save_student(
        &self,
        user: NewUser,
        profile: NewStudentProfile,
    ) -> Result<(User, StudentProfile), StoreError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.name)
        .bind(user.role)
        .fetch_one(&mut *tx)
        .await?;

        let profile = sqlx::query_as::<_, StudentProfile>(&format!(
            r#"
            INSERT INTO student_profiles (user_id, cpf, phone)
            VALUES ($1, $2, $3)
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(profile.cpf)
        .bind(profile.phone)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((user, profile))
    }
}
