//! GraphQL API for the Gazette publishing graph.
//!
//! Provides the schema, the relation loader registry and the HTTP
//! server. The layer is read-only: every query resolves through the
//! repository ports, and every object relation field resolves through
//! a dataloader so that a whole resolution pass issues one grouped
//! query per relation, however many parents requested it.
//!
//! # Building a schema
//!
//! ```ignore
//! use gazette_graphql::build_schema;
//!
//! let schema = build_schema(repositories, relation_store)?;
//! gazette_graphql::serve(schema, ServerConfig::default()).await?;
//! ```

mod loaders;
mod schema;
mod server;
mod types;

pub use loaders::{create_loaders, Loaders};
pub use schema::{
    build_schema, GazetteSchema, QueryRoot, MAX_QUERY_COMPLEXITY, MAX_QUERY_DEPTH,
};
pub use server::{serve, serve_with_shutdown, ServerConfig};
pub use types::Order;
