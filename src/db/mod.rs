//! Database layer
//!
//! SQLite through sqlx. The pool is created from `DatabaseConfig`, the
//! embedded migrations bring the schema up to date, and repositories wrap
//! every query the services need.
//!
//! # Usage
//!
//! ```ignore
//! use projekti::config::DatabaseConfig;
//! use projekti::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, ping, DbPool};
