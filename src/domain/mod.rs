//! Domain layer - entities, store contracts and errors

pub mod error;
pub mod token;

pub use error::DomainError;
