use sqlx::{Pool, Postgres};

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}

pub(crate) const USER_COLUMNS: &str = "id, email, password, name, role, created_at, updated_at";

pub(crate) const STUDENT_COLUMNS: &str = "id, user_id, cpf, phone, created_at, updated_at";

pub(crate) const INSTRUCTOR_COLUMNS: &str = "id, user_id, cpf, credential_number, phone, \
    price_per_hour, categories, bio, address, latitude, longitude, verification_status, \
    rejection_reason, rejection_notes, created_at, updated_at";

pub(crate) const VEHICLE_COLUMNS: &str =
    "id, instructor_id, brand, model, year, plate, transmission, is_adapted";

pub(crate) const LESSON_COLUMNS: &str = "id, student_id, instructor_id, scheduled_at, duration, \
    status, notes, created_at, updated_at";
