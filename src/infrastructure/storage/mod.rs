//! Storage infrastructure - Repository implementations

mod sqlite;

pub use sqlite::{SqliteConfig, SqliteProjectRepository};
