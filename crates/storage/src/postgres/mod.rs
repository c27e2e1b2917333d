//! PostgreSQL storage adapter.
//!
//! This module implements the repository and relation-store traits
//! defined in `gazette-core` using PostgreSQL as the backing store.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool and migrations
//! - [`PgRepositories`] - Composite repository implementing `Repositories`
//! - [`PgRelationStore`] - Grouped relation queries behind `RelationStore`
//! - [`keyset`] - The shared keyset pagination driver
//! - [`batch`] - The shared grouped-query builder
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::for_api(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let repositories = Arc::new(PgRepositories::new(db.pool().clone()));
//! let relations = Arc::new(PgRelationStore::new(db.pool().clone()));
//! ```

pub(crate) mod batch;
mod comment_repo;
mod database;
pub(crate) mod helpers;
pub(crate) mod keyset;
mod notification_repo;
mod post_repo;
mod relation_store;
mod series_repo;
mod tag_repo;
mod user_repo;

pub use comment_repo::PgCommentRepository;
pub use database::{Database, DatabaseConfig};
pub use notification_repo::PgNotificationRepository;
pub use post_repo::PgPostRepository;
pub use relation_store::PgRelationStore;
pub use series_repo::PgSeriesRepository;
pub use tag_repo::PgTagRepository;
pub use user_repo::PgUserRepository;

use sqlx::PgPool;

use gazette_core::ports::{
    CommentRepository, NotificationRepository, PostRepository, Repositories, SeriesRepository,
    TagRepository, UserRepository,
};

// =============================================================================
// Composite Repository
// =============================================================================

/// Aggregated PostgreSQL repositories implementing the `Repositories` trait.
///
/// One entry point for all entity queries; every repository shares the
/// same read pool.
pub struct PgRepositories {
    users: PgUserRepository,
    series: PgSeriesRepository,
    posts: PgPostRepository,
    comments: PgCommentRepository,
    tags: PgTagRepository,
    notifications: PgNotificationRepository,
}

impl PgRepositories {
    /// Create a new repository aggregate from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            series: PgSeriesRepository::new(pool.clone()),
            posts: PgPostRepository::new(pool.clone()),
            comments: PgCommentRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            notifications: PgNotificationRepository::new(pool),
        }
    }
}

impl Repositories for PgRepositories {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn series(&self) -> &dyn SeriesRepository {
        &self.series
    }

    fn posts(&self) -> &dyn PostRepository {
        &self.posts
    }

    fn comments(&self) -> &dyn CommentRepository {
        &self.comments
    }

    fn tags(&self) -> &dyn TagRepository {
        &self.tags
    }

    fn notifications(&self) -> &dyn NotificationRepository {
        &self.notifications
    }
}
