//! Port traits for data repositories.
//!
//! These traits define the storage interface used by the resolution
//! layer. Implementations live in the infrastructure layer
//! (`gazette-storage`). All list operations share the keyset pagination
//! contract; all batched operations return arrays aligned 1:1 with
//! their input parent-id array.

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::models::{Comment, Notification, Post, Reply, Series, Tag, User};

use super::pagination::{PageArgs, Paginated, RelationArgs};

// =============================================================================
// Filter Types
// =============================================================================

/// Filter options for post list queries.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub author_id: Option<i64>,
    pub series_id: Option<i64>,
    /// Restrict to posts carrying this tag slug.
    pub tag_slug: Option<String>,
    /// When set, keep only posts with (true) or without (false) a publish date.
    pub published: Option<bool>,
}

// =============================================================================
// Entity Repositories
// =============================================================================

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: i64) -> DomainResult<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>>;

    /// List users ordered by username (string cursor).
    async fn list_users(&self, page: PageArgs) -> DomainResult<Paginated<User>>;
}

/// Repository for series.
#[async_trait]
pub trait SeriesRepository: Send + Sync {
    async fn get_series(&self, id: i64) -> DomainResult<Option<Series>>;

    async fn get_series_by_slug(&self, slug: &str) -> DomainResult<Option<Series>>;

    /// List series ordered by id (recency cursor).
    async fn list_series(&self, page: PageArgs) -> DomainResult<Paginated<Series>>;
}

/// Repository for posts.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn get_post(&self, id: i64) -> DomainResult<Option<Post>>;

    async fn get_post_by_slug(&self, slug: &str) -> DomainResult<Option<Post>>;

    /// List posts with filtering, ordered by id (recency cursor).
    async fn list_posts(&self, filter: PostFilter, page: PageArgs)
        -> DomainResult<Paginated<Post>>;
}

/// Repository for comments and replies.
///
/// The list operations double as the deep-paging escape hatch for the
/// relation fields: relation windows stop at the first page, these
/// accept an `after` cursor.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn get_comment(&self, id: i64) -> DomainResult<Option<Comment>>;

    async fn list_comments(&self, post_id: i64, page: PageArgs)
        -> DomainResult<Paginated<Comment>>;

    async fn list_replies(
        &self,
        comment_id: i64,
        page: PageArgs,
    ) -> DomainResult<Paginated<Reply>>;
}

/// Repository for tags.
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn get_tag_by_slug(&self, slug: &str) -> DomainResult<Option<Tag>>;

    /// List tags ordered by slug (string cursor).
    async fn list_tags(&self, page: PageArgs) -> DomainResult<Paginated<Tag>>;
}

/// Repository for notifications.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn list_notifications(
        &self,
        recipient_id: i64,
        page: PageArgs,
    ) -> DomainResult<Paginated<Notification>>;
}

// =============================================================================
// Batched Relation Store
// =============================================================================

/// Batched relation operations consumed by the loader layer.
///
/// Every method takes the parent-id array of one coalesced batch and
/// returns a result array of exactly the same length and order,
/// substituting an empty page / zero / `None` for parents without
/// matches. One call is one grouped query per distinct parameter set.
#[async_trait]
pub trait RelationStore: Send + Sync {
    // Windowed relations.
    async fn posts_for_series(
        &self,
        series_ids: &[i64],
        args: RelationArgs,
    ) -> DomainResult<Vec<Paginated<Post>>>;

    async fn comments_for_posts(
        &self,
        post_ids: &[i64],
        args: RelationArgs,
    ) -> DomainResult<Vec<Paginated<Comment>>>;

    async fn replies_for_comments(
        &self,
        comment_ids: &[i64],
        args: RelationArgs,
    ) -> DomainResult<Vec<Paginated<Reply>>>;

    async fn tags_for_posts(
        &self,
        post_ids: &[i64],
        args: RelationArgs,
    ) -> DomainResult<Vec<Paginated<Tag>>>;

    async fn likers_for_posts(
        &self,
        post_ids: &[i64],
        args: RelationArgs,
    ) -> DomainResult<Vec<Paginated<User>>>;

    async fn followers_for_series(
        &self,
        series_ids: &[i64],
        args: RelationArgs,
    ) -> DomainResult<Vec<Paginated<User>>>;

    // Count-only relations.
    async fn comment_counts_for_posts(&self, post_ids: &[i64]) -> DomainResult<Vec<i64>>;

    async fn like_counts_for_posts(&self, post_ids: &[i64]) -> DomainResult<Vec<i64>>;

    async fn follower_counts_for_series(&self, series_ids: &[i64]) -> DomainResult<Vec<i64>>;

    // Viewer-scoped membership flags. The viewer is an explicit
    // parameter, never ambient request state.
    async fn posts_liked_by(&self, viewer_id: i64, post_ids: &[i64])
        -> DomainResult<Vec<bool>>;

    // Single-entity hydration by id.
    async fn users_by_ids(&self, ids: &[i64]) -> DomainResult<Vec<Option<User>>>;

    async fn series_by_ids(&self, ids: &[i64]) -> DomainResult<Vec<Option<Series>>>;
}

// =============================================================================
// Composite Repository
// =============================================================================

/// Combined repository access for the API.
pub trait Repositories: Send + Sync {
    fn users(&self) -> &dyn UserRepository;

    fn series(&self) -> &dyn SeriesRepository;

    fn posts(&self) -> &dyn PostRepository;

    fn comments(&self) -> &dyn CommentRepository;

    fn tags(&self) -> &dyn TagRepository;

    fn notifications(&self) -> &dyn NotificationRepository;
}
