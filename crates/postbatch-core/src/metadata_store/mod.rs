//! Durable metadata store (SQLite via sqlx).
//!
//! One row per post identifier: last processing status, fetched metadata,
//! attempt count and timestamps. The orchestrator consults it to skip posts
//! that already succeeded.

mod db;
mod error;
mod records;
mod types;

pub use db::*;
pub use error::StoreError;
pub use types::*;

#[cfg(test)]
mod tests;
