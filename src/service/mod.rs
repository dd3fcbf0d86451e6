pub mod admin_service;
pub mod auth_service;
pub mod error;
pub mod instructor_service;
pub mod lesson_service;
