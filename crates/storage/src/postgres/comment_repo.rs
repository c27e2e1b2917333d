//! Comment and reply repository implementation for PostgreSQL.
//!
//! The list operations accept an `after` cursor and are the deep-paging
//! path for the `Post.comments` / `Comment.replies` relation fields,
//! which only serve a first page.

use async_trait::async_trait;
use sqlx::PgPool;

use gazette_core::error::{DomainResult, StorageResult};
use gazette_core::models::{Comment, Reply};
use gazette_core::ports::{CommentRepository, CursorKind, PageArgs, Paginated};

use super::helpers::storage_err;
use super::keyset::{KeysetQuery, SqlValue};

pub(crate) const COMMENT_COLUMNS: &str = "id, post_id, author_id, body, created_at";
pub(crate) const REPLY_COLUMNS: &str = "id, comment_id, author_id, body, created_at";

/// PostgreSQL implementation of CommentRepository.
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn get_comment(&self, id: i64) -> DomainResult<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT id, post_id, author_id, body, created_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(CommentRow::into_comment).transpose()?)
    }

    async fn list_comments(
        &self,
        post_id: i64,
        page: PageArgs,
    ) -> DomainResult<Paginated<Comment>> {
        KeysetQuery::new("comments", COMMENT_COLUMNS, "id", CursorKind::Id)
            .filter("post_id =", SqlValue::BigInt(post_id))
            .fetch_page(&self.pool, &page, CommentRow::into_comment)
            .await
    }

    async fn list_replies(
        &self,
        comment_id: i64,
        page: PageArgs,
    ) -> DomainResult<Paginated<Reply>> {
        KeysetQuery::new("replies", REPLY_COLUMNS, "id", CursorKind::Id)
            .filter("comment_id =", SqlValue::BigInt(comment_id))
            .fetch_page(&self.pool, &page, ReplyRow::into_reply)
            .await
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Clone, sqlx::FromRow)]
pub(crate) struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    body: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl CommentRow {
    pub(crate) fn into_comment(self) -> StorageResult<Comment> {
        Ok(Comment {
            id: self.id,
            post_id: self.post_id,
            author_id: self.author_id,
            body: self.body,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone, sqlx::FromRow)]
pub(crate) struct ReplyRow {
    id: i64,
    comment_id: i64,
    author_id: i64,
    body: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl ReplyRow {
    pub(crate) fn into_reply(self) -> StorageResult<Reply> {
        Ok(Reply {
            id: self.id,
            comment_id: self.comment_id,
            author_id: self.author_id,
            body: self.body,
            created_at: self.created_at,
        })
    }
}
