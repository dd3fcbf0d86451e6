use bigdecimal::BigDecimal;
use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::usermodel::User;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "verification_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn to_str(&self) -> &str {
        match self {
            VerificationStatus::Pending => "PENDING",
            VerificationStatus::Approved => "APPROVED",
            VerificationStatus::Rejected => "REJECTED",
        }
    }

    /// Transitions an admin may drive. Resubmission (back to PENDING) is a
    /// self-service action and is always accepted.
    pub fn can_review_to(&self, next: VerificationStatus) -> bool {
        matches!(
            (self, next),
            (VerificationStatus::Pending, VerificationStatus::Approved)
                | (VerificationStatus::Pending, VerificationStatus::Rejected)
        )
    }

    pub fn transition_error(&self, next: VerificationStatus) -> String {
        format!(
            "Instructor is {} and cannot be moved to {}",
            self.to_str(),
            next.to_str()
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "transmission", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Transmission {
    Manual,
    Automatic,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct InstructorProfile {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub cpf: String,
    #[serde(rename = "credentialNumber")]
    pub credential_number: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "pricePerHour")]
    pub price_per_hour: BigDecimal,
    pub categories: Vec<String>,
    pub bio: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(rename = "verificationStatus")]
    pub verification_status: VerificationStatus,
    #[serde(rename = "rejectionReason")]
    pub rejection_reason: Option<String>,
    #[serde(rename = "rejectionNotes")]
    pub rejection_notes: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Vehicle {
    pub id: Uuid,
    #[serde(rename = "instructorId")]
    pub instructor_id: Uuid,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub plate: String,
    pub transmission: Transmission,
    #[serde(rename = "isAdapted")]
    pub is_adapted: bool,
}

/// Profile plus owning user and vehicles, the shape every listing returns.
#[derive(Debug, Serialize, Clone)]
pub struct InstructorDetails {
    #[serde(flatten)]
    pub profile: InstructorProfile,
    pub user: Option<User>,
    pub vehicles: Vec<Vehicle>,
}

#[derive(Debug, Clone)]
pub struct NewInstructorProfile {
    pub cpf: String,
    pub credential_number: Option<String>,
    pub phone: Option<String>,
    pub price_per_hour: BigDecimal,
    pub categories: Vec<String>,
    pub bio: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub plate: String,
    pub transmission: Transmission,
    pub is_adapted: bool,
}

/// Partial update applied by the profile owner. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct InstructorProfileUpdate {
    pub credential_number: Option<String>,
    pub phone: Option<String>,
    pub price_per_hour: Option<BigDecimal>,
    pub categories: Option<Vec<String>>,
    pub bio: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Conjunctive listing filter. Vehicle conditions must hold on the same vehicle.
#[derive(Debug, Clone, Default)]
pub struct InstructorFilter {
    pub status: Option<VerificationStatus>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub transmission: Option<Transmission>,
    pub adapted: Option<bool>,
}

impl InstructorFilter {
    pub fn has_vehicle_condition(&self) -> bool {
        self.transmission.is_some() || self.adapted.is_some()
    }

    pub fn vehicle_matches(&self, vehicle: &Vehicle) -> bool {
        self.transmission.map_or(true, |t| vehicle.transmission == t)
            && self.adapted.map_or(true, |a| vehicle.is_adapted == a)
    }

    pub fn matches(&self, details: &InstructorDetails) -> bool {
        let profile = &details.profile;

        if let Some(status) = self.status {
            if profile.verification_status != status {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if !profile.categories.iter().any(|c| c == category) {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_name = details
                .user
                .as_ref()
                .map_or(false, |u| u.name.to_lowercase().contains(&needle));
            let in_address = profile
                .address
                .as_ref()
                .map_or(false, |a| a.to_lowercase().contains(&needle));
            if !in_name && !in_address {
                return false;
            }
        }

        if self.has_vehicle_condition()
            && !details.vehicles.iter().any(|v| self.vehicle_matches(v))
        {
            return false;
        }

        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructorOrder {
    CreatedDesc,
    UpdatedDesc,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: &str, address: Option<&str>, categories: &[&str], vehicles: Vec<Vehicle>) -> InstructorDetails {
        let now = Utc::now();
        let id = Uuid::new_v4();
        InstructorDetails {
            profile: InstructorProfile {
                id,
                user_id: Uuid::new_v4(),
                cpf: "123".into(),
                credential_number: None,
                phone: None,
                price_per_hour: BigDecimal::from(80),
                categories: categories.iter().map(|c| c.to_string()).collect(),
                bio: None,
                address: address.map(str::to_string),
                latitude: None,
                longitude: None,
                verification_status: VerificationStatus::Approved,
                rejection_reason: None,
                rejection_notes: None,
                created_at: now,
                updated_at: now,
            },
            user: Some(User {
                id: Uuid::new_v4(),
                email: "i@x.com".into(),
                password: String::new(),
                name: name.into(),
                role: crate::models::usermodel::UserRole::Instructor,
                created_at: now,
                updated_at: now,
            }),
            vehicles,
        }
    }

    fn vehicle(transmission: Transmission, is_adapted: bool) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            instructor_id: Uuid::new_v4(),
            brand: "Fiat".into(),
            model: "Uno".into(),
            year: 2020,
            plate: "ABC1D23".into(),
            transmission,
            is_adapted,
        }
    }

    #[test]
    fn only_pending_transitions_are_reviewable() {
        use VerificationStatus::*;
        assert!(Pending.can_review_to(Approved));
        assert!(Pending.can_review_to(Rejected));
        assert!(!Rejected.can_review_to(Approved));
        assert!(!Approved.can_review_to(Rejected));
        assert!(!Approved.can_review_to(Approved));
    }

    #[test]
    fn search_is_case_insensitive_over_name_or_address() {
        let d = details("Carlos Souza", Some("Rua Augusta, São Paulo"), &["B"], vec![]);
        let by_name = InstructorFilter { search: Some("carlos".into()), ..Default::default() };
        let by_address = InstructorFilter { search: Some("AUGUSTA".into()), ..Default::default() };
        let miss = InstructorFilter { search: Some("recife".into()), ..Default::default() };
        assert!(by_name.matches(&d));
        assert!(by_address.matches(&d));
        assert!(!miss.matches(&d));
    }

    #[test]
    fn vehicle_conditions_must_hold_on_one_vehicle() {
        let d = details(
            "Ana",
            None,
            &["B"],
            vec![vehicle(Transmission::Manual, false), vehicle(Transmission::Automatic, true)],
        );
        let split = InstructorFilter {
            transmission: Some(Transmission::Manual),
            adapted: Some(true),
            ..Default::default()
        };
        let same = InstructorFilter {
            transmission: Some(Transmission::Automatic),
            adapted: Some(true),
            ..Default::default()
        };
        assert!(!split.matches(&d));
        assert!(same.matches(&d));
    }

    #[test]
    fn category_and_transmission_compose_conjunctively() {
        let d = details("Ana", None, &["A", "B"], vec![vehicle(Transmission::Automatic, false)]);
        let both = InstructorFilter {
            category: Some("B".into()),
            transmission: Some(Transmission::Manual),
            ..Default::default()
        };
        assert!(!both.matches(&d));
        let category_only = InstructorFilter { category: Some("B".into()), ..Default::default() };
        assert!(category_only.matches(&d));
    }
}
