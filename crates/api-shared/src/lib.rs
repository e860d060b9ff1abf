//! # API Shared
//!
//! Shared definitions for the synopsis HTTP API.
//!
//! Contains:
//! - Request and response bodies with OpenAPI schemas (`models` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and by clients that want typed bodies.

pub mod health;
pub mod models;

pub use health::HealthService;
pub use models::*;
