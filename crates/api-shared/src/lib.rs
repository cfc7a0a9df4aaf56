//! # API Shared
//!
//! Shared request/response definitions for the MedIntel APIs.
//!
//! Contains:
//! - Wire types with OpenAPI schemas (`dto` module)
//! - Payload validation that turns wire types into core inputs (`validation` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and `medintel-cli`.

pub mod dto;
pub mod health;
pub mod validation;

pub use dto::*;
pub use health::HealthService;
pub use validation::{ValidationError, ValidationResult};
