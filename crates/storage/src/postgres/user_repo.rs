//! User repository implementation for PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use gazette_core::error::{DomainResult, StorageResult};
use gazette_core::models::User;
use gazette_core::ports::{CursorKind, PageArgs, Paginated, UserRepository};

use super::helpers::storage_err;
use super::keyset::KeysetQuery;

pub(crate) const USER_COLUMNS: &str = "id, username, display_name, bio, created_at";

/// PostgreSQL implementation of UserRepository.
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_user(&self, id: i64) -> DomainResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, display_name, bio, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(UserRow::into_user).transpose()?)
    }

    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, display_name, bio, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(UserRow::into_user).transpose()?)
    }

    async fn list_users(&self, page: PageArgs) -> DomainResult<Paginated<User>> {
        KeysetQuery::new("users", USER_COLUMNS, "username", CursorKind::Key)
            .fetch_page(&self.pool, &page, UserRow::into_user)
            .await
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Clone, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: i64,
    username: String,
    display_name: String,
    bio: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl UserRow {
    pub(crate) fn into_user(self) -> StorageResult<User> {
        Ok(User {
            id: self.id,
            username: self.username,
            display_name: self.display_name,
            bio: self.bio,
            created_at: self.created_at,
        })
    }
}
