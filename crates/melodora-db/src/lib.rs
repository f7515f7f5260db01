//! Melodora Database Layer
//!
//! PostgreSQL access to the `songs` catalog and the `comparisons` log

pub mod connection;
pub mod models;
pub mod operations;

// Re-export commonly used types
pub use connection::{create_pool, test_connection, DbPool};
pub use models::{ComparisonRow, NewComparison, SongRow};
pub use operations::{
    get_all_songs, get_comparisons_by_user, insert_comparison, insert_comparison_json,
};

/// Reference schema for a fresh database
pub const SCHEMA_SQL: &str = include_str!("../schema.sql");
