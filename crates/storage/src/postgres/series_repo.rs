//! Series repository implementation for PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use gazette_core::error::{DomainResult, StorageResult};
use gazette_core::models::Series;
use gazette_core::ports::{CursorKind, PageArgs, Paginated, SeriesRepository};

use super::helpers::storage_err;
use super::keyset::KeysetQuery;

pub(crate) const SERIES_COLUMNS: &str = "id, author_id, slug, title, description, created_at";

/// PostgreSQL implementation of SeriesRepository.
pub struct PgSeriesRepository {
    pool: PgPool,
}

impl PgSeriesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeriesRepository for PgSeriesRepository {
    async fn get_series(&self, id: i64) -> DomainResult<Option<Series>> {
        let row = sqlx::query_as::<_, SeriesRow>(
            "SELECT id, author_id, slug, title, description, created_at \
             FROM series WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(SeriesRow::into_series).transpose()?)
    }

    async fn get_series_by_slug(&self, slug: &str) -> DomainResult<Option<Series>> {
        let row = sqlx::query_as::<_, SeriesRow>(
            "SELECT id, author_id, slug, title, description, created_at \
             FROM series WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(SeriesRow::into_series).transpose()?)
    }

    async fn list_series(&self, page: PageArgs) -> DomainResult<Paginated<Series>> {
        KeysetQuery::new("series", SERIES_COLUMNS, "id", CursorKind::Id)
            .fetch_page(&self.pool, &page, SeriesRow::into_series)
            .await
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Clone, sqlx::FromRow)]
pub(crate) struct SeriesRow {
    id: i64,
    author_id: i64,
    slug: String,
    title: String,
    description: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl SeriesRow {
    pub(crate) fn into_series(self) -> StorageResult<Series> {
        Ok(Series {
            id: self.id,
            author_id: self.author_id,
            slug: self.slug,
            title: self.title,
            description: self.description,
            created_at: self.created_at,
        })
    }
}
