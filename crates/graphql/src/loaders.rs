//! DataLoader implementations for relation fields.
//!
//! Every relation field resolves through one of these loaders, so the
//! per-parent fetches raised while a resolution pass walks an object
//! list coalesce into one grouped query per relation. Three kinds of
//! loaders:
//!
//! - windowed loaders: `LoadRequest` (parent id + relation args) →
//!   `Paginated<Child>`; keys are grouped by args and each distinct
//!   args group dispatches exactly one store call;
//! - count loaders: parent id → child count;
//! - entity loaders: id → entity, for author/series hydration, plus the
//!   viewer-membership loader backing `likedBy`.
//!
//! The loaders are cache-free: nothing persists past the batching
//! window, so instances can safely live for the process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dataloader::{DataLoader, Loader};

use gazette_core::error::{DomainError, DomainResult};
use gazette_core::metrics::record_loader_batch;
use gazette_core::models::{Comment, Post, Reply, Series, Tag, User};
use gazette_core::ports::{
    validate_relations, LoadRequest, Paginated, RelationArgs, RelationStore,
};

/// Group batched keys by their relation args, preserving first-seen
/// order. Requests with different args never share a query.
fn group_by_args(keys: &[LoadRequest]) -> Vec<(RelationArgs, Vec<i64>)> {
    let mut groups: Vec<(RelationArgs, Vec<i64>)> = Vec::new();
    for key in keys {
        match groups.iter_mut().find(|(args, _)| *args == key.args) {
            Some((_, ids)) => ids.push(key.parent_id),
            None => groups.push((key.args, vec![key.parent_id])),
        }
    }
    groups
}

// =============================================================================
// Windowed relation loaders
// =============================================================================

/// Generate a loader resolving a windowed relation for a batch of parents.
macro_rules! relation_loader {
    ($(#[$meta:meta])* $name:ident, $model:ty, $method:ident, $key:literal) => {
        $(#[$meta])*
        pub struct $name(Arc<dyn RelationStore>);

        impl Loader<LoadRequest> for $name {
            type Value = Paginated<$model>;
            type Error = Arc<DomainError>;

            async fn load(
                &self,
                keys: &[LoadRequest],
            ) -> Result<HashMap<LoadRequest, Self::Value>, Self::Error> {
                let mut out = HashMap::with_capacity(keys.len());
                for (args, parent_ids) in group_by_args(keys) {
                    record_loader_batch($key, parent_ids.len());
                    let pages = self.0.$method(&parent_ids, args).await.map_err(Arc::new)?;
                    for (parent_id, page) in parent_ids.into_iter().zip(pages) {
                        out.insert(LoadRequest { parent_id, args }, page);
                    }
                }
                Ok(out)
            }
        }
    };
}

relation_loader!(
    /// `Series.posts` windows.
    PostsBySeriesLoader, Post, posts_for_series, "series.posts"
);
relation_loader!(
    /// `Post.comments` windows.
    CommentsByPostLoader, Comment, comments_for_posts, "post.comments"
);
relation_loader!(
    /// `Comment.replies` windows.
    RepliesByCommentLoader, Reply, replies_for_comments, "comment.replies"
);
relation_loader!(
    /// `Post.tags` windows.
    TagsByPostLoader, Tag, tags_for_posts, "post.tags"
);
relation_loader!(
    /// `Post.likers` windows.
    LikersByPostLoader, User, likers_for_posts, "post.likers"
);
relation_loader!(
    /// `Series.followers` windows.
    FollowersBySeriesLoader, User, followers_for_series, "series.followers"
);

// =============================================================================
// Count loaders
// =============================================================================

/// Generate a loader resolving a child count for a batch of parents.
macro_rules! count_loader {
    ($(#[$meta:meta])* $name:ident, $method:ident, $key:literal) => {
        $(#[$meta])*
        pub struct $name(Arc<dyn RelationStore>);

        impl Loader<i64> for $name {
            type Value = i64;
            type Error = Arc<DomainError>;

            async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, i64>, Self::Error> {
                record_loader_batch($key, keys.len());
                let counts = self.0.$method(keys).await.map_err(Arc::new)?;
                Ok(keys.iter().copied().zip(counts).collect())
            }
        }
    };
}

count_loader!(
    /// `Post.commentCount`.
    CommentCountLoader, comment_counts_for_posts, "post.comment_count"
);
count_loader!(
    /// `Post.likeCount`.
    LikeCountLoader, like_counts_for_posts, "post.like_count"
);
count_loader!(
    /// `Series.followerCount`.
    FollowerCountLoader, follower_counts_for_series, "series.follower_count"
);

// =============================================================================
// Entity loaders
// =============================================================================

/// Loads users by id (authors, likers of record).
pub struct UserLoader(Arc<dyn RelationStore>);

impl Loader<i64> for UserLoader {
    type Value = User;
    type Error = Arc<DomainError>;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, User>, Self::Error> {
        record_loader_batch("user.by_id", keys.len());
        let users = self.0.users_by_ids(keys).await.map_err(Arc::new)?;
        Ok(keys
            .iter()
            .copied()
            .zip(users)
            .filter_map(|(id, user)| user.map(|u| (id, u)))
            .collect())
    }
}

/// Loads series by id (`Post.series`).
pub struct SeriesLoader(Arc<dyn RelationStore>);

impl Loader<i64> for SeriesLoader {
    type Value = Series;
    type Error = Arc<DomainError>;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Series>, Self::Error> {
        record_loader_batch("series.by_id", keys.len());
        let series = self.0.series_by_ids(keys).await.map_err(Arc::new)?;
        Ok(keys
            .iter()
            .copied()
            .zip(series)
            .filter_map(|(id, s)| s.map(|s| (id, s)))
            .collect())
    }
}

/// Key for viewer-scoped membership lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewerPost {
    pub viewer_id: i64,
    pub post_id: i64,
}

/// Whether a viewer liked each of a batch of posts.
///
/// The viewer id is part of the key: flags for different viewers form
/// separate groups, the same way different relation args do.
pub struct ViewerLikedLoader(Arc<dyn RelationStore>);

impl Loader<ViewerPost> for ViewerLikedLoader {
    type Value = bool;
    type Error = Arc<DomainError>;

    async fn load(
        &self,
        keys: &[ViewerPost],
    ) -> Result<HashMap<ViewerPost, bool>, Self::Error> {
        let mut by_viewer: Vec<(i64, Vec<i64>)> = Vec::new();
        for key in keys {
            match by_viewer.iter_mut().find(|(v, _)| *v == key.viewer_id) {
                Some((_, ids)) => ids.push(key.post_id),
                None => by_viewer.push((key.viewer_id, vec![key.post_id])),
            }
        }

        let mut out = HashMap::with_capacity(keys.len());
        for (viewer_id, post_ids) in by_viewer {
            record_loader_batch("post.liked_by", post_ids.len());
            let flags = self
                .0
                .posts_liked_by(viewer_id, &post_ids)
                .await
                .map_err(Arc::new)?;
            for (post_id, liked) in post_ids.into_iter().zip(flags) {
                out.insert(ViewerPost { viewer_id, post_id }, liked);
            }
        }
        Ok(out)
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Container for all DataLoader instances.
///
/// Built once at schema construction and stored in the schema data;
/// resolvers dispatch relation fetches exclusively through these
/// fields.
pub struct Loaders {
    pub posts_by_series: DataLoader<PostsBySeriesLoader>,
    pub comments_by_post: DataLoader<CommentsByPostLoader>,
    pub replies_by_comment: DataLoader<RepliesByCommentLoader>,
    pub tags_by_post: DataLoader<TagsByPostLoader>,
    pub likers_by_post: DataLoader<LikersByPostLoader>,
    pub followers_by_series: DataLoader<FollowersBySeriesLoader>,
    pub comment_count: DataLoader<CommentCountLoader>,
    pub like_count: DataLoader<LikeCountLoader>,
    pub follower_count: DataLoader<FollowerCountLoader>,
    pub users: DataLoader<UserLoader>,
    pub series: DataLoader<SeriesLoader>,
    pub viewer_liked: DataLoader<ViewerLikedLoader>,
}

/// Create all data loaders over one relation store.
///
/// Validates the relation registry first: a loader wired to an
/// unregistered relation must fail here, at startup, not on first use.
pub fn create_loaders(store: Arc<dyn RelationStore>) -> DomainResult<Loaders> {
    validate_relations()?;

    Ok(Loaders {
        posts_by_series: DataLoader::new(PostsBySeriesLoader(store.clone()), tokio::spawn),
        comments_by_post: DataLoader::new(CommentsByPostLoader(store.clone()), tokio::spawn),
        replies_by_comment: DataLoader::new(RepliesByCommentLoader(store.clone()), tokio::spawn),
        tags_by_post: DataLoader::new(TagsByPostLoader(store.clone()), tokio::spawn),
        likers_by_post: DataLoader::new(LikersByPostLoader(store.clone()), tokio::spawn),
        followers_by_series: DataLoader::new(FollowersBySeriesLoader(store.clone()), tokio::spawn),
        comment_count: DataLoader::new(CommentCountLoader(store.clone()), tokio::spawn),
        like_count: DataLoader::new(LikeCountLoader(store.clone()), tokio::spawn),
        follower_count: DataLoader::new(FollowerCountLoader(store.clone()), tokio::spawn),
        users: DataLoader::new(UserLoader(store.clone()), tokio::spawn),
        series: DataLoader::new(SeriesLoader(store.clone()), tokio::spawn),
        viewer_liked: DataLoader::new(ViewerLikedLoader(store), tokio::spawn),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazette_core::ports::OrderDirection;

    fn req(parent_id: i64, first: i32, order: OrderDirection) -> LoadRequest {
        LoadRequest {
            parent_id,
            args: RelationArgs::new(Some(first), order).unwrap(),
        }
    }

    // Test critique: des paramètres hétérogènes ne sont jamais fusionnés,
    // chaque jeu d'arguments forme son propre groupe (et sa propre requête)
    #[test]
    fn test_heterogeneous_args_form_separate_groups() {
        let keys = [
            req(1, 5, OrderDirection::Desc),
            req(2, 5, OrderDirection::Desc),
            req(3, 10, OrderDirection::Desc),
            req(4, 5, OrderDirection::Asc),
            req(5, 5, OrderDirection::Desc),
        ];

        let groups = group_by_args(&keys);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].1, vec![1, 2, 5]);
        assert_eq!(groups[1].1, vec![3]);
        assert_eq!(groups[2].1, vec![4]);
    }

    #[test]
    fn test_homogeneous_args_form_one_group() {
        let keys = [
            req(10, 20, OrderDirection::Desc),
            req(11, 20, OrderDirection::Desc),
        ];

        let groups = group_by_args(&keys);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].1, vec![10, 11]);
    }
}
