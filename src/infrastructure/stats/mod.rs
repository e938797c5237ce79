//! Request statistics

mod request_counter;

pub use request_counter::{RequestCounter, RequestStats, RotationHandle, DEFAULT_WINDOW};
