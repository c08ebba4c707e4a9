//! Request handlers, grouped by resource.

pub mod appointments;
pub mod auth;
pub mod consultations;
pub mod doctors;
pub mod patients;
pub mod seed;
