//! Infrastructure adapters

pub mod database;

pub use database::DatabaseManager;
