//! Storage infrastructure

pub mod migrations;
