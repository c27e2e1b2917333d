//! Core domain layer for the Gazette API.
//!
//! This crate contains the domain models, port traits (interfaces), and
//! the pagination/relation core for the social-publishing GraphQL API.
//! It follows hexagonal architecture principles - this is the innermost
//! layer with no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     gazette (binary)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   gazette-graphql                           │
//! │             (schema, loaders, server)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   gazette-storage                           │
//! │         (PostgreSQL: keyset engine, batcher, repos)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    gazette-core  ← YOU ARE HERE             │
//! │                 (models, ports, errors)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (User, Series, Post, Comment, ...)
//! - [`ports`] - Interface traits and the pagination/relation contracts
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Key Concepts
//!
//! ## Keyset pagination
//!
//! Every list the API returns - top-level or relation-level - is a
//! [`ports::Paginated`] window: edges with node-derived cursors, page
//! flags, and two counts (entities before the cursor position, entities
//! at or after it). [`ports::PageArgs`] validates client input before
//! any query runs.
//!
//! ## Batched relations
//!
//! Relation fetches raised for many parents during one resolution pass
//! coalesce into one grouped query per relation. [`ports::RELATIONS`]
//! enumerates every supported relation as data ([`ports::RelationShape`]:
//! direct foreign key or pivot table); [`ports::RelationStore`] is the
//! batched interface the loader layer consumes, always returning arrays
//! aligned 1:1 with the input parents.

pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
