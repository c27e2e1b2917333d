//! Storage layer for the Gazette API.
//!
//! This crate provides PostgreSQL implementations of the repository and
//! relation-store traits defined in `gazette-core`. It owns the two
//! query engines the whole API leans on:
//!
//! - the keyset pagination driver ([`postgres::keyset`]), which turns a
//!   table + filters + validated page arguments into one count statement
//!   (both window counts) and one window fetch;
//! - the grouped relation batcher ([`postgres::batch`]), which resolves
//!   a relation for a whole batch of parents in a single statement, for
//!   direct foreign-key and pivot-table shapes alike.
//!
//! # Usage
//!
//! ```ignore
//! use gazette_storage::{Database, DatabaseConfig, PgRelationStore, PgRepositories};
//!
//! let config = DatabaseConfig::for_api(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let repositories = Arc::new(PgRepositories::new(db.pool().clone()));
//! let relations = Arc::new(PgRelationStore::new(db.pool().clone()));
//! ```

pub mod postgres;

pub use postgres::{Database, DatabaseConfig, PgRelationStore, PgRepositories};
