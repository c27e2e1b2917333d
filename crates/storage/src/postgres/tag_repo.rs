//! Tag repository implementation for PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use gazette_core::error::{DomainResult, StorageResult};
use gazette_core::models::Tag;
use gazette_core::ports::{CursorKind, PageArgs, Paginated, TagRepository};

use super::helpers::storage_err;
use super::keyset::KeysetQuery;

pub(crate) const TAG_COLUMNS: &str = "id, slug, name";

/// PostgreSQL implementation of TagRepository.
pub struct PgTagRepository {
    pool: PgPool,
}

impl PgTagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn get_tag_by_slug(&self, slug: &str) -> DomainResult<Option<Tag>> {
        let row =
            sqlx::query_as::<_, TagRow>("SELECT id, slug, name FROM tags WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_err)?;

        Ok(row.map(TagRow::into_tag).transpose()?)
    }

    async fn list_tags(&self, page: PageArgs) -> DomainResult<Paginated<Tag>> {
        KeysetQuery::new("tags", TAG_COLUMNS, "slug", CursorKind::Key)
            .fetch_page(&self.pool, &page, TagRow::into_tag)
            .await
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Clone, sqlx::FromRow)]
pub(crate) struct TagRow {
    id: i64,
    slug: String,
    name: String,
}

impl TagRow {
    pub(crate) fn into_tag(self) -> StorageResult<Tag> {
        Ok(Tag {
            id: self.id,
            slug: self.slug,
            name: self.name,
        })
    }
}
