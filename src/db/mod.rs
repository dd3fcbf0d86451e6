pub mod db;
pub mod instructordb;
pub mod lessondb;
pub mod memory;
pub mod userdb;

use thiserror::Error;

pub use db::DBClient;
pub use instructordb::InstructorExt;
pub use lessondb::LessonExt;
pub use memory::MemoryStore;
pub use userdb::UserExt;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// A review reached a profile that is no longer PENDING.
    #[error("{0}")]
    InvalidTransition(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(
                    db_err.constraint().unwrap_or("unique").to_string(),
                );
            }
        }
        StoreError::Database(err)
    }
}

/// Everything the services need from persistence. Implemented by the
/// Postgres client and by the in-memory store.
pub trait Store: UserExt + InstructorExt + LessonExt + Send + Sync {}

impl<T> Store for T where T: UserExt + InstructorExt + LessonExt + Send + Sync {}
