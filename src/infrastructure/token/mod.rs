//! Token infrastructure implementations
//!
//! This module provides secret generation, the token service and the
//! in-memory and PostgreSQL token stores.

mod generator;
mod postgres_repository;
mod repository;
mod service;

pub use generator::{TokenGenerator, SECRET_PREFIX};
pub use postgres_repository::PostgresTokenRepository;
pub use repository::InMemoryTokenRepository;
pub use service::{TokenService, MAX_GENERATION_ATTEMPTS};
