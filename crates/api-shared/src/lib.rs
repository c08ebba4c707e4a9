//! # API Shared
//!
//! Shared utilities and definitions for the clinic API surface.
//!
//! Contains:
//! - Session credential issue/verify and the [`auth::Identity`] value
//!   threaded into every domain call
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and by `clinic-core` services that need to make
//! identity-scoped decisions.

pub mod auth;
pub mod health;

pub use auth::{AuthError, Identity, SESSION_COOKIE};
pub use health::{HealthRes, HealthService};
