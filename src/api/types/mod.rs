//! Shared API types

pub mod error;
pub mod json;

pub use error::{codes, ApiError, ApiErrorDetail, ApiErrorResponse};
pub use json::Json;
