pub mod admin;
pub mod auth;
pub mod email;
pub mod instructors;
pub mod lessons;
