//! Post repository implementation for PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use gazette_core::error::{DomainResult, StorageResult};
use gazette_core::models::Post;
use gazette_core::ports::{CursorKind, PageArgs, Paginated, PostFilter, PostRepository};

use super::helpers::storage_err;
use super::keyset::{KeysetQuery, SqlValue};

pub(crate) const POST_COLUMNS: &str =
    "id, author_id, series_id, slug, title, body, published_at, created_at";

/// PostgreSQL implementation of PostRepository.
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn get_post(&self, id: i64) -> DomainResult<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, author_id, series_id, slug, title, body, published_at, created_at \
             FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(PostRow::into_post).transpose()?)
    }

    async fn get_post_by_slug(&self, slug: &str) -> DomainResult<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, author_id, series_id, slug, title, body, published_at, created_at \
             FROM posts WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(PostRow::into_post).transpose()?)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        page: PageArgs,
    ) -> DomainResult<Paginated<Post>> {
        let mut query = KeysetQuery::new("posts", POST_COLUMNS, "id", CursorKind::Id);

        if let Some(author_id) = filter.author_id {
            query = query.filter("author_id =", SqlValue::BigInt(author_id));
        }
        if let Some(series_id) = filter.series_id {
            query = query.filter("series_id =", SqlValue::BigInt(series_id));
        }
        if let Some(tag_slug) = filter.tag_slug {
            query = query.filter_wrapped(
                "id IN (SELECT pt.post_id FROM post_tags pt \
                 JOIN tags t ON t.id = pt.tag_id WHERE t.slug =",
                SqlValue::Text(tag_slug),
                ")",
            );
        }
        match filter.published {
            Some(true) => query = query.condition("published_at IS NOT NULL"),
            Some(false) => query = query.condition("published_at IS NULL"),
            None => {}
        }

        query.fetch_page(&self.pool, &page, PostRow::into_post).await
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Clone, sqlx::FromRow)]
pub(crate) struct PostRow {
    id: i64,
    author_id: i64,
    series_id: Option<i64>,
    slug: String,
    title: String,
    body: String,
    published_at: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl PostRow {
    pub(crate) fn into_post(self) -> StorageResult<Post> {
        Ok(Post {
            id: self.id,
            author_id: self.author_id,
            series_id: self.series_id,
            slug: self.slug,
            title: self.title,
            body: self.body,
            published_at: self.published_at,
            created_at: self.created_at,
        })
    }
}
