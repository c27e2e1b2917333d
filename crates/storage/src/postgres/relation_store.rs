//! Batched relation store implementation for PostgreSQL.
//!
//! One method per registered relation; each dispatches exactly one
//! grouped statement through the batcher and converts the per-parent
//! windows into the shared paginated shape. Relation-level windows are
//! always first pages: `previous_count` is 0 and no cursor applies.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use gazette_core::error::{DomainError, DomainResult, StorageResult};
use gazette_core::models::{Comment, Post, Reply, Series, Tag, User};
use gazette_core::ports::{
    relation, Cursored, Paginated, RelationArgs, RelationShape, RelationStore,
};

use super::batch::{batch_counts, batch_membership, batch_windows, RelationWindow};
use super::comment_repo::{CommentRow, ReplyRow};
use super::helpers::storage_err;
use super::post_repo::PostRow;
use super::series_repo::SeriesRow;
use super::tag_repo::TagRow;
use super::user_repo::UserRow;

/// PostgreSQL implementation of RelationStore.
pub struct PgRelationStore {
    pool: PgPool,
}

impl PgRelationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationStore for PgRelationStore {
    async fn posts_for_series(
        &self,
        series_ids: &[i64],
        args: RelationArgs,
    ) -> DomainResult<Vec<Paginated<Post>>> {
        let cfg = relation("series", "posts")?;
        let windows = batch_windows::<PostRow>(&self.pool, cfg, series_ids, args).await?;
        windows_to_pages(windows, args, PostRow::into_post)
    }

    async fn comments_for_posts(
        &self,
        post_ids: &[i64],
        args: RelationArgs,
    ) -> DomainResult<Vec<Paginated<Comment>>> {
        let cfg = relation("post", "comments")?;
        let windows = batch_windows::<CommentRow>(&self.pool, cfg, post_ids, args).await?;
        windows_to_pages(windows, args, CommentRow::into_comment)
    }

    async fn replies_for_comments(
        &self,
        comment_ids: &[i64],
        args: RelationArgs,
    ) -> DomainResult<Vec<Paginated<Reply>>> {
        let cfg = relation("comment", "replies")?;
        let windows = batch_windows::<ReplyRow>(&self.pool, cfg, comment_ids, args).await?;
        windows_to_pages(windows, args, ReplyRow::into_reply)
    }

    async fn tags_for_posts(
        &self,
        post_ids: &[i64],
        args: RelationArgs,
    ) -> DomainResult<Vec<Paginated<Tag>>> {
        let cfg = relation("post", "tags")?;
        let windows = batch_windows::<TagRow>(&self.pool, cfg, post_ids, args).await?;
        windows_to_pages(windows, args, TagRow::into_tag)
    }

    async fn likers_for_posts(
        &self,
        post_ids: &[i64],
        args: RelationArgs,
    ) -> DomainResult<Vec<Paginated<User>>> {
        let cfg = relation("post", "likers")?;
        let windows = batch_windows::<UserRow>(&self.pool, cfg, post_ids, args).await?;
        windows_to_pages(windows, args, UserRow::into_user)
    }

    async fn followers_for_series(
        &self,
        series_ids: &[i64],
        args: RelationArgs,
    ) -> DomainResult<Vec<Paginated<User>>> {
        let cfg = relation("series", "followers")?;
        let windows = batch_windows::<UserRow>(&self.pool, cfg, series_ids, args).await?;
        windows_to_pages(windows, args, UserRow::into_user)
    }

    async fn comment_counts_for_posts(&self, post_ids: &[i64]) -> DomainResult<Vec<i64>> {
        let cfg = relation("post", "comments")?;
        batch_counts(&self.pool, &cfg.shape, post_ids).await
    }

    async fn like_counts_for_posts(&self, post_ids: &[i64]) -> DomainResult<Vec<i64>> {
        let cfg = relation("post", "likers")?;
        batch_counts(&self.pool, &cfg.shape, post_ids).await
    }

    async fn follower_counts_for_series(&self, series_ids: &[i64]) -> DomainResult<Vec<i64>> {
        let cfg = relation("series", "followers")?;
        batch_counts(&self.pool, &cfg.shape, series_ids).await
    }

    async fn posts_liked_by(
        &self,
        viewer_id: i64,
        post_ids: &[i64],
    ) -> DomainResult<Vec<bool>> {
        let cfg = relation("post", "likers")?;
        match cfg.shape {
            RelationShape::Pivot {
                pivot_table,
                parent_key,
                child_key,
                ..
            } => {
                batch_membership(
                    &self.pool,
                    pivot_table,
                    parent_key,
                    child_key,
                    viewer_id,
                    post_ids,
                )
                .await
            }
            RelationShape::Direct { .. } => Err(DomainError::ValidationError(
                "post.likers must be registered as a pivot relation".into(),
            )),
        }
    }

    async fn users_by_ids(&self, ids: &[i64]) -> DomainResult<Vec<Option<User>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, username, display_name, bio, created_at FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let users = rows
            .into_iter()
            .map(UserRow::into_user)
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(align_by_id(ids, users, |u| u.id))
    }

    async fn series_by_ids(&self, ids: &[i64]) -> DomainResult<Vec<Option<Series>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<SeriesRow> = sqlx::query_as(
            "SELECT id, author_id, slug, title, description, created_at \
             FROM series WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let series = rows
            .into_iter()
            .map(SeriesRow::into_series)
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(align_by_id(ids, series, |s| s.id))
    }
}

// =============================================================================
// Window Conversion
// =============================================================================

/// Convert raw windows into pages, preserving alignment.
fn windows_to_pages<R, T, F>(
    windows: Vec<RelationWindow<R>>,
    args: RelationArgs,
    map: F,
) -> DomainResult<Vec<Paginated<T>>>
where
    T: Cursored,
    F: Fn(R) -> StorageResult<T>,
{
    windows
        .into_iter()
        .map(|w| {
            let nodes = w
                .rows
                .into_iter()
                .map(&map)
                .collect::<StorageResult<Vec<_>>>()?;
            Ok(Paginated::from_window(nodes, 0, w.count, args.first))
        })
        .collect()
}

/// Align fetched entities to the requested id array.
fn align_by_id<T: Clone>(ids: &[i64], items: Vec<T>, id_of: impl Fn(&T) -> i64) -> Vec<Option<T>> {
    let by_id: HashMap<i64, T> = items.into_iter().map(|t| (id_of(&t), t)).collect();
    ids.iter().map(|id| by_id.get(id).cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazette_core::ports::{CursorValue, OrderDirection};

    #[derive(Debug, Clone, PartialEq)]
    struct Node(i64);

    impl Cursored for Node {
        fn cursor_value(&self) -> CursorValue {
            CursorValue::Id(self.0)
        }
    }

    fn args(first: i32) -> RelationArgs {
        RelationArgs::new(Some(first), OrderDirection::Desc).unwrap()
    }

    // Scénario "9 abonnés, first=2": fenêtre de 2, compte complet 9,
    // page suivante oui, page précédente non (jamais de curseur ici)
    #[test]
    fn test_relation_window_first_page_semantics() {
        let windows = vec![RelationWindow {
            count: 9,
            rows: vec![9i64, 8],
        }];

        let pages = windows_to_pages(windows, args(2), |id| Ok(Node(id))).unwrap();

        let page = &pages[0];
        assert_eq!(page.edges.len(), 2);
        assert_eq!(page.current_count, 9);
        assert_eq!(page.previous_count, 0);
        assert!(page.page_info.has_next_page);
        assert!(!page.page_info.has_previous_page);
    }

    // Test critique: une fenêtre vide reste une page vide alignée,
    // jamais une entrée manquante
    #[test]
    fn test_empty_window_becomes_empty_page() {
        let windows: Vec<RelationWindow<i64>> =
            vec![RelationWindow::default(), RelationWindow { count: 1, rows: vec![1] }];

        let pages = windows_to_pages(windows, args(5), |id| Ok(Node(id))).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].current_count, 0);
        assert!(pages[0].edges.is_empty());
        assert!(!pages[0].page_info.has_next_page);
        assert_eq!(pages[1].edges.len(), 1);
    }

    #[test]
    fn test_align_by_id_with_missing_and_duplicates() {
        let items = vec![Node(1), Node(3)];
        let aligned = align_by_id(&[3, 2, 1, 3], items, |n| n.0);

        assert_eq!(aligned, vec![Some(Node(3)), None, Some(Node(1)), Some(Node(3))]);
    }
}
