//! Storage layer for mise
//!
//! SQLite recipe catalogue (pooled connections, versioned migrations) and
//! the two-stage filtered similarity search over it.

pub mod database;
pub mod query;
mod recipes;

pub use database::{Database, DbPool, DbStats};
pub use query::{build_search_query, SqlQuery};
pub use recipes::{RecipeRecord, RecipeStore};
