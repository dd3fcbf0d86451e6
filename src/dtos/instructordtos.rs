use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use super::{validate_cpf, validate_name};
use crate::models::instructormodel::{
    InstructorDetails, InstructorFilter, InstructorProfileUpdate, NewInstructorProfile,
    NewVehicle, Transmission, VerificationStatus,
};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct VehicleDto {
    #[validate(length(min = 1, max = 100, message = "Brand must have 1 to 100 characters"))]
    pub brand: String,

    #[validate(length(min = 1, max = 100, message = "Model must have 1 to 100 characters"))]
    pub model: String,

    #[validate(range(min = 1950, max = 2100, message = "Year is out of range"))]
    pub year: i32,

    #[validate(length(min = 1, max = 20, message = "Plate must have 1 to 20 characters"))]
    pub plate: String,

    pub transmission: Transmission,

    #[serde(rename = "isAdapted", default)]
    pub is_adapted: bool,
}

impl From<VehicleDto> for NewVehicle {
    fn from(dto: VehicleDto) -> Self {
        NewVehicle {
            brand: dto.brand,
            model: dto.model,
            year: dto.year,
            plate: dto.plate.trim().to_uppercase(),
            transmission: dto.transmission,
            is_adapted: dto.is_adapted,
        }
    }
}

/// Validates every vehicle in the list, reporting the first failure.
pub fn validate_vehicles(vehicles: &[VehicleDto]) -> Result<(), ValidationErrors> {
    for vehicle in vehicles {
        vehicle.validate()?;
    }
    Ok(())
}

fn validate_categories(categories: &Vec<String>) -> Result<(), ValidationError> {
    if categories.iter().any(|c| c.trim().is_empty()) {
        let mut error = ValidationError::new("categories");
        error.message = Some("Categories cannot contain blank entries".into());
        return Err(error);
    }
    Ok(())
}

/// Latitude and longitude must fall inside their geographic ranges.
pub fn validate_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if latitude.map_or(false, |v| !(-90.0..=90.0).contains(&v)) {
        let mut error = ValidationError::new("range");
        error.message = Some("Latitude is out of range".into());
        errors.add("latitude", error);
    }
    if longitude.map_or(false, |v| !(-180.0..=180.0).contains(&v)) {
        let mut error = ValidationError::new("range");
        error.message = Some("Longitude is out of range".into());
        errors.add("longitude", error);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Trimmed, uppercased and deduplicated, keeping first-seen order.
pub fn normalize_categories(categories: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(categories.len());
    for category in categories {
        let category = category.trim().to_uppercase();
        if !normalized.contains(&category) {
            normalized.push(category);
        }
    }
    normalized
}

pub fn to_price(value: f64) -> BigDecimal {
    format!("{:.2}", value)
        .parse::<BigDecimal>()
        .unwrap_or_default()
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstructorDto {
    #[validate(
        length(max = 255, message = "Name must be at most 255 characters"),
        custom = "validate_name"
    )]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        length(max = 255, message = "Email must be at most 255 characters"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    #[validate(
        length(max = 20, message = "CPF must be at most 20 characters"),
        custom = "validate_cpf"
    )]
    pub cpf: String,

    #[serde(rename = "credentialNumber")]
    #[validate(length(max = 100, message = "Credential number must be at most 100 characters"))]
    pub credential_number: Option<String>,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[serde(rename = "pricePerHour")]
    #[validate(range(
        min = 0.0,
        max = 99_999_999.99,
        message = "Price per hour must be between 0 and 99999999.99"
    ))]
    pub price_per_hour: f64,

    #[validate(
        length(min = 1, message = "At least one category is required"),
        custom = "validate_categories"
    )]
    pub categories: Vec<String>,

    pub bio: Option<String>,
    pub address: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    #[serde(default)]
    pub vehicles: Vec<VehicleDto>,
}

impl CreateInstructorDto {
    pub fn profile(&self) -> NewInstructorProfile {
        NewInstructorProfile {
            cpf: self.cpf.trim().to_string(),
            credential_number: self.credential_number.clone(),
            phone: self.phone.clone(),
            price_per_hour: to_price(self.price_per_hour),
            categories: normalize_categories(&self.categories),
            bio: self.bio.clone(),
            address: self.address.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            verification_status: VerificationStatus::Approved,
        }
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct RequestVerificationDto {
    #[validate(
        length(max = 20, message = "CPF must be at most 20 characters"),
        custom = "validate_cpf"
    )]
    pub cpf: String,

    #[serde(rename = "credentialNumber")]
    #[validate(length(max = 100, message = "Credential number must be at most 100 characters"))]
    pub credential_number: Option<String>,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[serde(rename = "pricePerHour")]
    #[validate(range(
        min = 0.0,
        max = 99_999_999.99,
        message = "Price per hour must be between 0 and 99999999.99"
    ))]
    pub price_per_hour: f64,

    #[validate(
        length(min = 1, message = "At least one category is required"),
        custom = "validate_categories"
    )]
    pub categories: Vec<String>,

    pub bio: Option<String>,
    pub address: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub vehicles: Option<Vec<VehicleDto>>,
}

impl RequestVerificationDto {
    pub fn profile(&self) -> NewInstructorProfile {
        NewInstructorProfile {
            cpf: self.cpf.trim().to_string(),
            credential_number: self.credential_number.clone(),
            phone: self.phone.clone(),
            price_per_hour: to_price(self.price_per_hour),
            categories: normalize_categories(&self.categories),
            bio: self.bio.clone(),
            address: self.address.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            verification_status: VerificationStatus::Pending,
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateInstructorDto {
    #[serde(rename = "credentialNumber")]
    #[validate(length(max = 100, message = "Credential number must be at most 100 characters"))]
    pub credential_number: Option<String>,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[serde(rename = "pricePerHour")]
    #[validate(range(
        min = 0.0,
        max = 99_999_999.99,
        message = "Price per hour must be between 0 and 99999999.99"
    ))]
    pub price_per_hour: Option<f64>,

    #[validate(
        length(min = 1, message = "At least one category is required"),
        custom = "validate_categories"
    )]
    pub categories: Option<Vec<String>>,

    pub bio: Option<String>,
    pub address: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<UpdateInstructorDto> for InstructorProfileUpdate {
    fn from(dto: UpdateInstructorDto) -> Self {
        InstructorProfileUpdate {
            credential_number: dto.credential_number,
            phone: dto.phone,
            price_per_hour: dto.price_per_hour.map(to_price),
            categories: dto.categories.as_deref().map(normalize_categories),
            bio: dto.bio,
            address: dto.address,
            latitude: dto.latitude,
            longitude: dto.longitude,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct InstructorFilterQuery {
    pub status: Option<VerificationStatus>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub transmission: Option<Transmission>,
    pub adapted: Option<bool>,
}

impl From<InstructorFilterQuery> for InstructorFilter {
    fn from(query: InstructorFilterQuery) -> Self {
        let non_blank = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };

        InstructorFilter {
            status: query.status,
            category: non_blank(query.category).map(|c| c.to_uppercase()),
            search: non_blank(query.search),
            transmission: query.transmission,
            adapted: query.adapted,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct StatusQuery {
    pub status: Option<VerificationStatus>,
}

#[derive(Debug, Serialize)]
pub struct InstructorResponseDto {
    pub status: String,
    pub data: InstructorDetails,
}

#[derive(Debug, Serialize)]
pub struct InstructorListResponseDto {
    pub status: String,
    pub instructors: Vec<InstructorDetails>,
    pub results: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(year: i32) -> VehicleDto {
        VehicleDto {
            brand: "Fiat".into(),
            model: "Argo".into(),
            year,
            plate: "abc1d23".into(),
            transmission: Transmission::Manual,
            is_adapted: false,
        }
    }

    fn create_dto() -> CreateInstructorDto {
        CreateInstructorDto {
            name: "Carlos".into(),
            email: "carlos@x.com".into(),
            password: None,
            cpf: "222".into(),
            credential_number: None,
            phone: None,
            price_per_hour: 90.0,
            categories: vec!["B".into()],
            bio: None,
            address: None,
            latitude: None,
            longitude: None,
            vehicles: vec![],
        }
    }

    fn request_dto() -> RequestVerificationDto {
        RequestVerificationDto {
            cpf: "333".into(),
            credential_number: None,
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

    #[test]
    fn create_rejects_blank_name_and_cpf() {
        let body = CreateInstructorDto {
            name: "  ".into(),
            cpf: "   ".into(),
            ..create_dto()
        };
        let errors = body.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("cpf"));
    }

    #[test]
    fn request_rejects_blank_cpf() {
        let body = RequestVerificationDto {
            cpf: "\t ".into(),
            ..request_dto()
        };
        let errors = body.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("cpf"));
    }

    #[test]
    fn values_wider_than_their_columns_are_rejected() {
        let body = CreateInstructorDto {
            cpf: "1".repeat(21),
            phone: Some("9".repeat(31)),
            price_per_hour: 100_000_000.0,
            ..create_dto()
        };
        let errors = body.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("cpf"));
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("pricePerHour"));

        let update = UpdateInstructorDto {
            price_per_hour: Some(100_000_000.0),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let mut wide = vehicle(2020);
        wide.plate = "X".repeat(21);
        wide.brand = "B".repeat(101);
        let errors = wide.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("plate"));
        assert!(errors.field_errors().contains_key("brand"));

        assert!(create_dto().validate().is_ok());
        assert!(RequestVerificationDto {
            price_per_hour: 99_999_999.99,
            ..request_dto()
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn categories_are_stored_as_an_uppercase_set() {
        let body = RequestVerificationDto {
            categories: vec!["b".into(), " B ".into(), "a".into(), "B".into()],
            ..request_dto()
        };
        assert_eq!(body.profile().categories, vec!["B", "A"]);

        let update: InstructorProfileUpdate = UpdateInstructorDto {
            categories: Some(vec!["d".into(), "D".into()]),
            ..Default::default()
        }
        .into();
        assert_eq!(update.categories, Some(vec!["D".to_string()]));

        let filter: InstructorFilter = InstructorFilterQuery {
            category: Some(" b ".into()),
            ..Default::default()
        }
        .into();
        assert_eq!(filter.category.as_deref(), Some("B"));
    }

    #[test]
    fn price_is_rounded_to_cents() {
        assert_eq!(to_price(89.999).to_string(), "90.00");
        assert_eq!(to_price(120.5).to_string(), "120.50");
    }

    #[test]
    fn vehicle_list_fails_on_any_bad_entry() {
        assert!(validate_vehicles(&[vehicle(2020)]).is_ok());
        assert!(validate_vehicles(&[vehicle(2020), vehicle(1800)]).is_err());
    }

    #[test]
    fn coordinates_outside_the_globe_are_rejected() {
        assert!(validate_coordinates(Some(-23.55), Some(-46.63)).is_ok());
        assert!(validate_coordinates(None, None).is_ok());
        let errors = validate_coordinates(Some(91.0), Some(0.0)).unwrap_err();
        assert!(errors.field_errors().contains_key("latitude"));
    }

    #[test]
    fn blank_query_values_are_ignored() {
        let filter: InstructorFilter = InstructorFilterQuery {
            category: Some("  ".into()),
            search: Some(" carlos ".into()),
            ..Default::default()
        }
        .into();
        assert!(filter.category.is_none());
        assert_eq!(filter.search.as_deref(), Some("carlos"));
    }

    #[test]
    fn request_deserializes_camel_case_with_vehicles() {
        let body: RequestVerificationDto = serde_json::from_value(serde_json::json!({
            "cpf": "111",
            "pricePerHour": 80,
            "categories": ["B"],
            "vehicles": [{
                "brand": "VW", "model": "Polo", "year": 2021,
                "plate": "xyz9a87", "transmission": "AUTOMATIC", "isAdapted": true
            }]
        }))
        .unwrap();
        assert!(body.validate().is_ok());
        let vehicles: Vec<NewVehicle> = body
            .vehicles
            .unwrap()
            .into_iter()
            .map(NewVehicle::from)
            .collect();
        assert_eq!(vehicles[0].plate, "XYZ9A87");
        assert!(vehicles[0].is_adapted);
    }
}
