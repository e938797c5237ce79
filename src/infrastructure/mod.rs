//! Infrastructure layer - storage, services and observability

pub mod logging;
pub mod observability;
pub mod stats;
pub mod storage;
pub mod token;
