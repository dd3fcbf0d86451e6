use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgExecutor, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::{
    db::{DBClient, INSTRUCTOR_COLUMNS, USER_COLUMNS, VEHICLE_COLUMNS},
    StoreError,
};
use crate::models::{
    instructormodel::{
        InstructorDetails, InstructorFilter, InstructorOrder, InstructorProfile,
        InstructorProfileUpdate, NewInstructorProfile, NewVehicle, VerificationStatus, Vehicle,
    },
    usermodel::{NewUser, User, UserRole},
};

#[async_trait]
pub trait InstructorExt {
    async fn get_instructor_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<InstructorProfile>, StoreError>;

    async fn get_instructor_profile_by_cpf(
        &self,
        cpf: &str,
    ) -> Result<Option<InstructorProfile>, StoreError>;

    async fn get_instructor(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<InstructorDetails>, StoreError>;

    async fn get_instructor_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<InstructorDetails>, StoreError>;

    async fn list_instructors(
        &self,
        filter: &InstructorFilter,
    ) -> Result<Vec<InstructorDetails>, StoreError>;

    async fn list_instructors_by_status(
        &self,
        status: VerificationStatus,
        order: InstructorOrder,
    ) -> Result<Vec<InstructorDetails>, StoreError>;

    /// Creates an INSTRUCTOR user, its profile and vehicles in one transaction.
    async fn save_instructor(
        &self,
        user: NewUser,
        profile: NewInstructorProfile,
        vehicles: Vec<NewVehicle>,
    ) -> Result<InstructorDetails, StoreError>;

    /// Creates or replaces the user's instructor profile as PENDING with the
    /// rejection fields cleared. `vehicles`, when given, replaces the fleet.
    async fn upsert_verification_request(
        &self,
        user_id: Uuid,
        profile: NewInstructorProfile,
        vehicles: Option<Vec<NewVehicle>>,
    ) -> Result<InstructorDetails, StoreError>;

    async fn update_instructor_profile(
        &self,
        user_id: Uuid,
        update: InstructorProfileUpdate,
    ) -> Result<Option<InstructorProfile>, StoreError>;

    /// Marks the profile APPROVED and promotes the user to INSTRUCTOR. Both
    /// writes commit together or not at all.
    async fn approve_instructor(
        &self,
        user_id: Uuid,
    ) -> Result<(User, InstructorProfile), StoreError>;

    async fn reject_instructor(
        &self,
        user_id: Uuid,
        reason: &str,
        notes: Option<&str>,
    ) -> Result<InstructorProfile, StoreError>;
}

fn prefixed(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_like(search: &str) -> String {
    search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl DBClient {
    async fn attach_details(
        &self,
        profiles: Vec<InstructorProfile>,
    ) -> Result<Vec<InstructorDetails>, StoreError> {
        if profiles.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids: Vec<Uuid> = profiles.iter().map(|p| p.user_id).collect();
        let profile_ids: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(&user_ids)
        .fetch_all(&self.pool)
        .await?;

        let vehicles = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE instructor_id = ANY($1) ORDER BY year DESC"
        ))
        .bind(&profile_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut users: HashMap<Uuid, User> = users.into_iter().map(|u| (u.id, u)).collect();
        let mut fleet: HashMap<Uuid, Vec<Vehicle>> = HashMap::new();
        for vehicle in vehicles {
            fleet.entry(vehicle.instructor_id).or_default().push(vehicle);
        }

        Ok(profiles
            .into_iter()
            .map(|profile| InstructorDetails {
                user: users.remove(&profile.user_id),
                vehicles: fleet.remove(&profile.id).unwrap_or_default(),
                profile,
            })
            .collect())
    }

    async fn one_with_details(
        &self,
        profile: Option<InstructorProfile>,
    ) -> Result<Option<InstructorDetails>, StoreError> {
        match profile {
            Some(profile) => Ok(self.attach_details(vec![profile]).await?.pop()),
            None => Ok(None),
        }
    }
}

async fn insert_vehicles(
    tx: &mut Transaction<'_, Postgres>,
    instructor_id: Uuid,
    vehicles: Vec<NewVehicle>,
) -> Result<(), StoreError> {
    for vehicle in vehicles {
        sqlx::query(
            r#"
            INSERT INTO vehicles (instructor_id, brand, model, year, plate, transmission, is_adapted)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(instructor_id)
        .bind(vehicle.brand)
        .bind(vehicle.model)
        .bind(vehicle.year)
        .bind(vehicle.plate)
        .bind(vehicle.transmission)
        .bind(vehicle.is_adapted)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl InstructorExt for DBClient {
    async fn get_instructor_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<InstructorProfile>, StoreError> {
        let profile = sqlx::query_as::<_, InstructorProfile>(&format!(
            "SELECT {INSTRUCTOR_COLUMNS} FROM instructor_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn get_instructor_profile_by_cpf(
        &self,
        cpf: &str,
    ) -> Result<Option<InstructorProfile>, StoreError> {
        let profile = sqlx::query_as::<_, InstructorProfile>(&format!(
            "SELECT {INSTRUCTOR_COLUMNS} FROM instructor_profiles WHERE cpf = $1"
        ))
        .bind(cpf)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn get_instructor(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<InstructorDetails>, StoreError> {
        let profile = sqlx::query_as::<_, InstructorProfile>(&format!(
            "SELECT {INSTRUCTOR_COLUMNS} FROM instructor_profiles WHERE id = $1"
        ))
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?;

        self.one_with_details(profile).await
    }

    async fn get_instructor_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<InstructorDetails>, StoreError> {
        let profile = self.get_instructor_profile(user_id).await?;
        self.one_with_details(profile).await
    }

    async fn list_instructors(
        &self,
        filter: &InstructorFilter,
    ) -> Result<Vec<InstructorDetails>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM instructor_profiles ip JOIN users u ON u.id = ip.user_id WHERE TRUE",
            prefixed(INSTRUCTOR_COLUMNS, "ip")
        ));

        if let Some(status) = filter.status {
            qb.push(" AND ip.verification_status = ").push_bind(status);
        }

        if let Some(category) = &filter.category {
            qb.push(" AND ")
                .push_bind(category.clone())
                .push(" = ANY(ip.categories)");
        }

        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (u.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR ip.address ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if filter.has_vehicle_condition() {
            qb.push(" AND EXISTS (SELECT 1 FROM vehicles v WHERE v.instructor_id = ip.id");
            if let Some(transmission) = filter.transmission {
                qb.push(" AND v.transmission = ").push_bind(transmission);
            }
            if let Some(adapted) = filter.adapted {
                qb.push(" AND v.is_adapted = ").push_bind(adapted);
            }
            qb.push(")");
        }

        qb.push(" ORDER BY ip.created_at DESC");

        let profiles = qb
            .build_query_as::<InstructorProfile>()
            .fetch_all(&self.pool)
            .await?;

        self.attach_details(profiles).await
    }

    async fn list_instructors_by_status(
        &self,
        status: VerificationStatus,
        order: InstructorOrder,
    ) -> Result<Vec<InstructorDetails>, StoreError> {
        let order_by = match order {
            InstructorOrder::CreatedDesc => "created_at DESC",
            InstructorOrder::UpdatedDesc => "updated_at DESC",
        };

        let profiles = sqlx::query_as::<_, InstructorProfile>(&format!(
            "SELECT {INSTRUCTOR_COLUMNS} FROM instructor_profiles WHERE verification_status = $1 ORDER BY {order_by}"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        self.attach_details(profiles).await
    }

    async fn save_instructor(
        &self,
        user: NewUser,
        profile: NewInstructorProfile,
        vehicles: Vec<NewVehicle>,
    ) -> Result<InstructorDetails, StoreError> {
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
        .bind(UserRole::Instructor)
        .fetch_one(&mut *tx)
        .await?;

        let profile = sqlx::query_as::<_, InstructorProfile>(&format!(
            r#"
            INSERT INTO instructor_profiles (
                user_id, cpf, credential_number, phone, price_per_hour, categories,
                bio, address, latitude, longitude, verification_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {INSTRUCTOR_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(profile.cpf)
        .bind(profile.credential_number)
        .bind(profile.phone)
        .bind(profile.price_per_hour)
        .bind(profile.categories)
        .bind(profile.bio)
        .bind(profile.address)
        .bind(profile.latitude)
        .bind(profile.longitude)
        .bind(profile.verification_status)
        .fetch_one(&mut *tx)
        .await?;

        insert_vehicles(&mut tx, profile.id, vehicles).await?;

        tx.commit().await?;

        self.one_with_details(Some(profile))
            .await?
            .ok_or(StoreError::NotFound("instructor profile"))
    }

    async fn upsert_verification_request(
        &self,
        user_id: Uuid,
        profile: NewInstructorProfile,
        vehicles: Option<Vec<NewVehicle>>,
    ) -> Result<InstructorDetails, StoreError> {
        let mut tx = self.pool.begin().await?;

        let profile = sqlx::query_as::<_, InstructorProfile>(&format!(
            r#"
            INSERT INTO instructor_profiles (
                user_id, cpf, credential_number, phone, price_per_hour, categories,
                bio, address, latitude, longitude, verification_status,
                rejection_reason, rejection_notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'PENDING', NULL, NULL)
            ON CONFLICT (user_id) DO UPDATE SET
                cpf = EXCLUDED.cpf,
                credential_number = EXCLUDED.credential_number,
                phone = EXCLUDED.phone,
                price_per_hour = EXCLUDED.price_per_hour,
                categories = EXCLUDED.categories,
                bio = EXCLUDED.bio,
                address = EXCLUDED.address,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                verification_status = 'PENDING',
                rejection_reason = NULL,
                rejection_notes = NULL,
                updated_at = NOW()
            RETURNING {INSTRUCTOR_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(profile.cpf)
        .bind(profile.credential_number)
        .bind(profile.phone)
        .bind(profile.price_per_hour)
        .bind(profile.categories)
        .bind(profile.bio)
        .bind(profile.address)
        .bind(profile.latitude)
        .bind(profile.longitude)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(vehicles) = vehicles {
            sqlx::query("DELETE FROM vehicles WHERE instructor_id = $1")
                .bind(profile.id)
                .execute(&mut *tx)
                .await?;
            insert_vehicles(&mut tx, profile.id, vehicles).await?;
        }

        tx.commit().await?;

        self.one_with_details(Some(profile))
            .await?
            .ok_or(StoreError::NotFound("instructor profile"))
    }

    async fn update_instructor_profile(
        &self,
        user_id: Uuid,
        update: InstructorProfileUpdate,
    ) -> Result<Option<InstructorProfile>, StoreError> {
        let profile = sqlx::query_as::<_, InstructorProfile>(&format!(
            r#"
            UPDATE instructor_profiles SET
                credential_number = COALESCE($2, credential_number),
                phone = COALESCE($3, phone),
                price_per_hour = COALESCE($4, price_per_hour),
                categories = COALESCE($5, categories),
                bio = COALESCE($6, bio),
                address = COALESCE($7, address),
                latitude = COALESCE($8, latitude),
                longitude = COALESCE($9, longitude),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {INSTRUCTOR_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(update.credential_number)
        .bind(update.phone)
        .bind(update.price_per_hour)
        .bind(update.categories)
        .bind(update.bio)
        .bind(update.address)
        .bind(update.latitude)
        .bind(update.longitude)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn approve_instructor(
        &self,
        user_id: Uuid,
    ) -> Result<(User, InstructorProfile), StoreError> {
        let mut tx = self.pool.begin().await?;

        let profile = sqlx::query_as::<_, InstructorProfile>(&format!(
            r#"
            UPDATE instructor_profiles SET
                verification_status = 'APPROVED',
                rejection_reason = NULL,
                rejection_notes = NULL,
                updated_at = NOW()
            WHERE user_id = $1 AND verification_status = 'PENDING'
            RETURNING {INSTRUCTOR_COLUMNS}
            "#
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let profile = match profile {
            Some(profile) => profile,
            None => {
                return Err(
                    review_conflict(&mut *tx, user_id, VerificationStatus::Approved).await,
                )
            }
        };

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(UserRole::Instructor)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound("user"))?;

        tx.commit().await?;

        Ok((user, profile))
    }

    async fn reject_instructor(
        &self,
        user_id: Uuid,
        reason: &str,
        notes: Option<&str>,
    ) -> Result<InstructorProfile, StoreError> {
        let profile = sqlx::query_as::<_, InstructorProfile>(&format!(
            r#"
            UPDATE instructor_profiles SET
                verification_status = 'REJECTED',
                rejection_reason = $2,
                rejection_notes = $3,
                updated_at = NOW()
            WHERE user_id = $1 AND verification_status = 'PENDING'
            RETURNING {INSTRUCTOR_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(reason)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?;

        match profile {
            Some(profile) => Ok(profile),
            None => Err(review_conflict(&self.pool, user_id, VerificationStatus::Rejected).await),
        }
    }
}

/// Explains why a PENDING-guarded review update touched no row.
async fn review_conflict<'e, E>(
    executor: E,
    user_id: Uuid,
    requested: VerificationStatus,
) -> StoreError
where
    E: PgExecutor<'e>,
{
    let current = sqlx::query_scalar::<_, VerificationStatus>(
        "SELECT verification_status FROM instructor_profiles WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await;

    match current {
        Ok(Some(current)) => StoreError::InvalidTransition(current.transition_error(requested)),
        Ok(None) => StoreError::NotFound("instructor profile"),
        Err(e) => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_qualifies_every_column() {
        assert_eq!(prefixed("id, user_id,cpf", "ip"), "ip.id, ip.user_id, ip.cpf");
    }

    #[test]
    fn escape_like_neutralises_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
