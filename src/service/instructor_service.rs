use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{InstructorExt, Store, UserExt},
    dtos::instructordtos::{
        validate_coordinates, validate_vehicles, CreateInstructorDto, RequestVerificationDto,
        UpdateInstructorDto,
    },
    error::ErrorMessage,
    models::{
        instructormodel::{
            InstructorDetails, InstructorFilter, InstructorOrder, InstructorProfileUpdate,
            NewVehicle, VerificationStatus,
        },
        usermodel::{NewUser, UserRole},
    },
    service::error::ServiceError,
    utils::password,
};

pub struct InstructorService {
    db_client: Arc<dyn Store>,
    default_password: Option<String>,
}

impl InstructorService {
    pub fn new(db_client: Arc<dyn Store>, default_password: Option<String>) -> Self {
        Self {
            db_client,
            default_password,
        }
    }

    /// Admin path: the account is created already APPROVED with the INSTRUCTOR role.
    pub async fn create(&self, body: CreateInstructorDto) -> Result<InstructorDetails, ServiceError> {
        body.validate()?;
        validate_coordinates(body.latitude, body.longitude)?;
        validate_vehicles(&body.vehicles)?;

        let email = body.email.trim().to_lowercase();
        let profile = body.profile();

        if self.db_client.get_user(None, Some(&email)).await?.is_some() {
            return Err(ErrorMessage::EmailExist.into());
        }
        if self
            .db_client
            .get_instructor_profile_by_cpf(&profile.cpf)
            .await?
            .is_some()
        {
            return Err(ErrorMessage::CpfExist.into());
        }

        let raw_password = body
            .password
            .clone()
            .or_else(|| self.default_password.clone())
            .ok_or_else(|| {
                ServiceError::Validation(
                    "Password is required when no default instructor password is configured"
                        .to_string(),
                )
            })?;
        let password_hash = password::hash(raw_password)?;

        let vehicles: Vec<NewVehicle> = body.vehicles.into_iter().map(NewVehicle::from).collect();

        let details = self
            .db_client
            .save_instructor(
                NewUser {
                    email,
                    password_hash,
                    name: body.name.trim().to_string(),
                    role: UserRole::Instructor,
                },
                profile,
                vehicles,
            )
            .await?;

        tracing::info!(
            instructor_id = %details.profile.id,
            user_id = %details.profile.user_id,
            "instructor created by admin"
        );

        Ok(details)
    }

    pub async fn find_all(
        &self,
        filter: InstructorFilter,
    ) -> Result<Vec<InstructorDetails>, ServiceError> {
        Ok(self.db_client.list_instructors(&filter).await?)
    }

    pub async fn find_one(&self, id: Uuid) -> Result<InstructorDetails, ServiceError> {
        self.db_client
            .get_instructor(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Instructor not found".to_string()))
    }

    pub async fn find_mine(&self, user_id: Uuid) -> Result<InstructorDetails, ServiceError> {
        self.db_client
            .get_instructor_by_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Instructor profile not found".to_string()))
    }

    /// Patches contact, pricing and location fields. CPF, status and role are untouched.
    pub async fn update_mine(
        &self,
        user_id: Uuid,
        body: UpdateInstructorDto,
    ) -> Result<InstructorDetails, ServiceError> {
        body.validate()?;
        validate_coordinates(body.latitude, body.longitude)?;

        let update: InstructorProfileUpdate = body.into();
        self.db_client
            .update_instructor_profile(user_id, update)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Instructor profile not found".to_string()))?;

        self.find_mine(user_id).await
    }

    /// Submits or resubmits the caller's instructor application. The profile
    /// always lands in PENDING with any previous rejection cleared.
    pub async fn request_verification(
        &self,
        user_id: Uuid,
        body: RequestVerificationDto,
    ) -> Result<InstructorDetails, ServiceError> {
        body.validate()?;
        validate_coordinates(body.latitude, body.longitude)?;
        if let Some(vehicles) = &body.vehicles {
            validate_vehicles(vehicles)?;
        }

        let user = self
            .db_client
            .get_user(Some(user_id), None)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        if user.role == UserRole::Admin {
            tracing::warn!(user_id = %user_id, "admin attempted to request instructor verification");
            return Err(ServiceError::Forbidden(
                "Administrators cannot request instructor verification".to_string(),
            ));
        }

        let profile = body.profile();
        if let Some(owner) = self
            .db_client
            .get_instructor_profile_by_cpf(&profile.cpf)
            .await?
        {
            if owner.user_id != user_id {
                return Err(ErrorMessage::CpfExist.into());
            }
        }

        let vehicles = body
            .vehicles
            .map(|list| list.into_iter().map(NewVehicle::from).collect());

        let details = self
            .db_client
            .upsert_verification_request(user_id, profile, vehicles)
            .await?;

        tracing::info!(
            user_id = %user_id,
            instructor_id = %details.profile.id,
            "instructor verification requested"
        );

        Ok(details)
    }

    pub async fn find_by_verification_status(
        &self,
        status: VerificationStatus,
    ) -> Result<Vec<InstructorDetails>, ServiceError> {
        Ok(self
            .db_client
            .list_instructors_by_status(status, InstructorOrder::CreatedDesc)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        dtos::instructordtos::VehicleDto,
        models::instructormodel::Transmission,
    };

    fn service() -> (Arc<MemoryStore>, InstructorService) {
        let store = Arc::new(MemoryStore::new());
        let service = InstructorService::new(store.clone(), Some("instrutor123".into()));
        (store, service)
    }

    fn vehicle(transmission: Transmission, is_adapted: bool) -> VehicleDto {
        VehicleDto {
            brand: "Fiat".into(),
            model: "Mobi".into(),
            year: 2022,
            plate: "abc1d23".into(),
            transmission,
            is_adapted,
        }
    }

    fn create_dto(email: &str, cpf: &str, name: &str) -> CreateInstructorDto {
        CreateInstructorDto {
            name: name.into(),
            email: email.into(),
            password: None,
            cpf: cpf.into(),
            credential_number: Some("CRED-1".into()),
            phone: None,
            price_per_hour: 95.0,
            categories: vec!["B".into()],
            bio: None,
            address: Some("Av. Paulista, São Paulo".into()),
            latitude: None,
            longitude: None,
            vehicles: vec![],
        }
    }

    fn request_dto(cpf: &str) -> RequestVerificationDto {
        RequestVerificationDto {
            cpf: cpf.into(),
            credential_number: None,
            phone: None,
            price_per_hour: 70.0,
            categories: vec!["B".into()],
            bio: None,
            address: None,
            latitude: None,
            longitude: None,
            vehicles: None,
        }
    }

    async fn student(store: &MemoryStore, email: &str, role: UserRole) -> Uuid {
        store
            .save_user(NewUser {
                email: email.into(),
                password_hash: "hash".into(),
                name: "Student".into(),
                role,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn admin_create_is_approved_instructor() {
        let (store, service) = service();
        let details = service
            .create(CreateInstructorDto {
                vehicles: vec![vehicle(Transmission::Manual, false)],
                ..create_dto("Carlos@X.com", "900", "Carlos")
            })
            .await
            .unwrap();

        assert_eq!(details.profile.verification_status, VerificationStatus::Approved);
        assert_eq!(details.user.as_ref().unwrap().role, UserRole::Instructor);
        assert_eq!(details.user.as_ref().unwrap().email, "carlos@x.com");
        assert_eq!(details.vehicles.len(), 1);

        let user = store.get_user(None, Some("carlos@x.com")).await.unwrap().unwrap();
        assert!(password::compare("instrutor123", &user.password).unwrap());
    }

    #[tokio::test]
    async fn admin_create_conflicts_on_duplicates() {
        let (_, service) = service();
        service.create(create_dto("c@x.com", "900", "Carlos")).await.unwrap();

        let email = service.create(create_dto("c@x.com", "901", "Other")).await.unwrap_err();
        assert!(matches!(email, ServiceError::Conflict(_)));
        let cpf = service.create(create_dto("d@x.com", "900", "Other")).await.unwrap_err();
        assert!(matches!(cpf, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn admin_create_without_any_password_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        let service = InstructorService::new(store, None);
        let err = service.create(create_dto("c@x.com", "900", "Carlos")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn filters_compose_conjunctively() {
        let (_, service) = service();
        service
            .create(CreateInstructorDto {
                vehicles: vec![vehicle(Transmission::Manual, false)],
                ..create_dto("a@x.com", "1", "Carlos Souza")
            })
            .await
            .unwrap();
        service
            .create(CreateInstructorDto {
                categories: vec!["A".into()],
                vehicles: vec![vehicle(Transmission::Automatic, true)],
                ..create_dto("b@x.com", "2", "Beatriz Alves")
            })
            .await
            .unwrap();

        let all = service.find_all(InstructorFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        // Newest first.
        assert_eq!(all[0].user.as_ref().unwrap().name, "Beatriz Alves");

        let manual_b = service
            .find_all(InstructorFilter {
                category: Some("B".into()),
                transmission: Some(Transmission::Manual),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(manual_b.len(), 1);
        assert_eq!(manual_b[0].user.as_ref().unwrap().name, "Carlos Souza");

        let none = service
            .find_all(InstructorFilter {
                category: Some("A".into()),
                transmission: Some(Transmission::Manual),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());

        let by_address = service
            .find_all(InstructorFilter {
                search: Some("paulista".into()),
                adapted: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_address.len(), 1);
    }

    #[tokio::test]
    async fn request_verification_keeps_role_and_sets_pending() {
        let (store, service) = service();
        let user_id = student(&store, "s@x.com", UserRole::Student).await;

        let details = service
            .request_verification(
                user_id,
                RequestVerificationDto {
                    vehicles: Some(vec![vehicle(Transmission::Automatic, false)]),
                    ..request_dto("111")
                },
            )
            .await
            .unwrap();

        assert_eq!(details.profile.verification_status, VerificationStatus::Pending);
        assert_eq!(details.user.unwrap().role, UserRole::Student);
        assert_eq!(details.vehicles.len(), 1);
    }

    #[tokio::test]
    async fn resubmission_without_vehicles_keeps_fleet() {
        let (store, service) = service();
        let user_id = student(&store, "s@x.com", UserRole::Student).await;
        service
            .request_verification(
                user_id,
                RequestVerificationDto {
                    vehicles: Some(vec![vehicle(Transmission::Manual, false)]),
                    ..request_dto("111")
                },
            )
            .await
            .unwrap();
        store.reject_instructor(user_id, "blurry", Some("resend")).await.unwrap();

        let details = service.request_verification(user_id, request_dto("111")).await.unwrap();
        assert_eq!(details.profile.verification_status, VerificationStatus::Pending);
        assert!(details.profile.rejection_reason.is_none());
        assert_eq!(details.vehicles.len(), 1);
    }

    #[tokio::test]
    async fn admin_cannot_request_verification() {
        let (store, service) = service();
        let admin_id = student(&store, "admin@x.com", UserRole::Admin).await;
        let err = service.request_verification(admin_id, request_dto("1")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn foreign_cpf_conflicts_and_unknown_user_is_not_found() {
        let (store, service) = service();
        let first = student(&store, "a@x.com", UserRole::Student).await;
        let second = student(&store, "b@x.com", UserRole::Student).await;
        service.request_verification(first, request_dto("111")).await.unwrap();

        let err = service.request_verification(second, request_dto("111")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = service
            .request_verification(Uuid::new_v4(), request_dto("222"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_mine_leaves_status_alone() {
        let (store, service) = service();
        let user_id = student(&store, "a@x.com", UserRole::Student).await;
        service.request_verification(user_id, request_dto("111")).await.unwrap();

        let details = service
            .update_mine(
                user_id,
                UpdateInstructorDto {
                    price_per_hour: Some(150.0),
                    bio: Some("Paciente".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(details.profile.price_per_hour.to_string(), "150.00");
        assert_eq!(details.profile.bio.as_deref(), Some("Paciente"));
        assert_eq!(details.profile.verification_status, VerificationStatus::Pending);

        let err = service
            .update_mine(Uuid::new_v4(), UpdateInstructorDto::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn find_by_status_filters_by_equality() {
        let (store, service) = service();
        service.create(create_dto("c@x.com", "900", "Carlos")).await.unwrap();
        let user_id = student(&store, "s@x.com", UserRole::Student).await;
        service.request_verification(user_id, request_dto("111")).await.unwrap();

        let pending = service
            .find_by_verification_status(VerificationStatus::Pending)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].profile.user_id, user_id);
    }
}
