//! GraphQL object types and connections.
//!
//! Thin wrappers over the core models plus the Relay-style connection
//! types. Every relation field dispatches through [`Loaders`], so
//! resolving it for N parents in one pass costs one grouped query, not
//! N. Relation fields take `(first, order)` only; for later pages use
//! the matching top-level query.

use async_graphql::{ComplexObject, Context, Result};
use chrono::{DateTime, Utc};

use gazette_core::error::DomainError;
use gazette_core::metrics::record_store_error;
use gazette_core::models;
use gazette_core::ports::{LoadRequest, OrderDirection, Paginated, RelationArgs};

use crate::loaders::{Loaders, ViewerPost};

// -----------------------------------------------------------------------------
// Error Mapping
// -----------------------------------------------------------------------------

/// Map a domain error to a GraphQL error.
///
/// Cursor and argument errors are reported precisely; storage and
/// wiring failures surface as a generic message so internal query
/// structure never leaks to clients.
pub(crate) fn graphql_error(operation: &'static str, err: &DomainError) -> async_graphql::Error {
    if err.is_client_error() {
        async_graphql::Error::new(err.to_string())
    } else {
        tracing::error!(operation, error = %err, "operation failed");
        record_store_error(operation);
        async_graphql::Error::new("Internal server error")
    }
}

// -----------------------------------------------------------------------------
// Ordering
// -----------------------------------------------------------------------------

/// Ordering direction.
#[derive(async_graphql::Enum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Desc,
    Asc,
}

impl From<Order> for OrderDirection {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => OrderDirection::Asc,
            Order::Desc => OrderDirection::Desc,
        }
    }
}

// -----------------------------------------------------------------------------
// Object Types
// -----------------------------------------------------------------------------

/// User account.
#[derive(async_graphql::SimpleObject)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<models::User> for User {
    fn from(u: models::User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            display_name: u.display_name,
            bio: u.bio,
            created_at: u.created_at,
        }
    }
}

/// Series of posts.
#[derive(async_graphql::SimpleObject)]
#[graphql(complex)]
pub struct Series {
    pub id: i64,
    #[graphql(skip)]
    pub author_id: i64,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<models::Series> for Series {
    fn from(s: models::Series) -> Self {
        Self {
            id: s.id,
            author_id: s.author_id,
            slug: s.slug,
            title: s.title,
            description: s.description,
            created_at: s.created_at,
        }
    }
}

/// Published post.
#[derive(async_graphql::SimpleObject)]
#[graphql(complex)]
pub struct Post {
    pub id: i64,
    #[graphql(skip)]
    pub author_id: i64,
    #[graphql(skip)]
    pub series_id: Option<i64>,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<models::Post> for Post {
    fn from(p: models::Post) -> Self {
        Self {
            id: p.id,
            author_id: p.author_id,
            series_id: p.series_id,
            slug: p.slug,
            title: p.title,
            body: p.body,
            published_at: p.published_at,
            created_at: p.created_at,
        }
    }
}

/// Comment on a post.
#[derive(async_graphql::SimpleObject)]
#[graphql(complex)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    #[graphql(skip)]
    pub author_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<models::Comment> for Comment {
    fn from(c: models::Comment) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            author_id: c.author_id,
            body: c.body,
            created_at: c.created_at,
        }
    }
}

/// Reply to a comment.
#[derive(async_graphql::SimpleObject)]
#[graphql(complex)]
pub struct Reply {
    pub id: i64,
    pub comment_id: i64,
    #[graphql(skip)]
    pub author_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<models::Reply> for Reply {
    fn from(r: models::Reply) -> Self {
        Self {
            id: r.id,
            comment_id: r.comment_id,
            author_id: r.author_id,
            body: r.body,
            created_at: r.created_at,
        }
    }
}

/// Content tag.
#[derive(async_graphql::SimpleObject)]
pub struct Tag {
    pub slug: String,
    pub name: String,
}

impl From<models::Tag> for Tag {
    fn from(t: models::Tag) -> Self {
        Self {
            slug: t.slug,
            name: t.name,
        }
    }
}

/// What a notification is about.
#[derive(async_graphql::Enum, Clone, Copy, PartialEq, Eq)]
#[graphql(remote = "models::NotificationKind")]
pub enum NotificationKind {
    Comment,
    Reply,
    Like,
    Follow,
}

/// Notification for one account.
#[derive(async_graphql::SimpleObject)]
pub struct Notification {
    pub id: i64,
    pub kind: NotificationKind,
    pub topic: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<models::Notification> for Notification {
    fn from(n: models::Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind.into(),
            topic: n.topic,
            message: n.message,
            read: n.read,
            created_at: n.created_at,
        }
    }
}

// -----------------------------------------------------------------------------
// Connection Types (keyset pagination)
// -----------------------------------------------------------------------------

#[derive(async_graphql::SimpleObject)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

/// Generate connection types (Edge + Connection) with From impl.
macro_rules! define_connection {
    ($node:ty, $core_model:ty, $edge:ident, $connection:ident) => {
        #[derive(async_graphql::SimpleObject)]
        pub struct $edge {
            pub node: $node,
            pub cursor: String,
        }

        #[derive(async_graphql::SimpleObject)]
        pub struct $connection {
            pub edges: Vec<$edge>,
            pub page_info: PageInfo,
            /// Entities at or after the cursor position.
            pub current_count: i64,
            /// Entities strictly before the cursor position.
            pub previous_count: i64,
        }

        impl From<Paginated<$core_model>> for $connection {
            fn from(page: Paginated<$core_model>) -> Self {
                Self {
                    edges: page
                        .edges
                        .into_iter()
                        .map(|e| $edge {
                            node: <$node>::from(e.node),
                            cursor: e.cursor.0,
                        })
                        .collect(),
                    page_info: PageInfo {
                        has_next_page: page.page_info.has_next_page,
                        has_previous_page: page.page_info.has_previous_page,
                        start_cursor: page.page_info.start_cursor.map(|c| c.0),
                        end_cursor: page.page_info.end_cursor.map(|c| c.0),
                    },
                    current_count: page.current_count,
                    previous_count: page.previous_count,
                }
            }
        }
    };
}

define_connection!(User, models::User, UserEdge, UserConnection);
define_connection!(Series, models::Series, SeriesEdge, SeriesConnection);
define_connection!(Post, models::Post, PostEdge, PostConnection);
define_connection!(Comment, models::Comment, CommentEdge, CommentConnection);
define_connection!(Reply, models::Reply, ReplyEdge, ReplyConnection);
define_connection!(Tag, models::Tag, TagEdge, TagConnection);
define_connection!(
    Notification,
    models::Notification,
    NotificationEdge,
    NotificationConnection
);

// -----------------------------------------------------------------------------
// Relation Fields
// -----------------------------------------------------------------------------

#[ComplexObject]
impl Post {
    /// Post author.
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let loaders = ctx.data::<Loaders>()?;
        let user = loaders
            .users
            .load_one(self.author_id)
            .await
            .map_err(|e| graphql_error("post.author", &e))?;
        Ok(user.map(User::from))
    }

    /// Series this post belongs to, if any.
    async fn series(&self, ctx: &Context<'_>) -> Result<Option<Series>> {
        let Some(series_id) = self.series_id else {
            return Ok(None);
        };
        let loaders = ctx.data::<Loaders>()?;
        let series = loaders
            .series
            .load_one(series_id)
            .await
            .map_err(|e| graphql_error("post.series", &e))?;
        Ok(series.map(Series::from))
    }

    /// First page of comments. For later pages use the top-level
    /// `comments` query.
    async fn comments(
        &self,
        ctx: &Context<'_>,
        first: Option<i32>,
        #[graphql(default)] order: Order,
    ) -> Result<CommentConnection> {
        let loaders = ctx.data::<Loaders>()?;
        let args = RelationArgs::new(first, order.into())
            .map_err(|e| graphql_error("post.comments", &e))?;
        let page = loaders
            .comments_by_post
            .load_one(LoadRequest {
                parent_id: self.id,
                args,
            })
            .await
            .map_err(|e| graphql_error("post.comments", &e))?
            .unwrap_or_else(Paginated::empty);
        Ok(page.into())
    }

    /// Total number of comments.
    async fn comment_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let loaders = ctx.data::<Loaders>()?;
        let count = loaders
            .comment_count
            .load_one(self.id)
            .await
            .map_err(|e| graphql_error("post.comment_count", &e))?;
        Ok(count.unwrap_or(0))
    }

    /// Tags on this post, alphabetical.
    async fn tags(&self, ctx: &Context<'_>, first: Option<i32>) -> Result<TagConnection> {
        let loaders = ctx.data::<Loaders>()?;
        let args = RelationArgs::new(first, OrderDirection::Asc)
            .map_err(|e| graphql_error("post.tags", &e))?;
        let page = loaders
            .tags_by_post
            .load_one(LoadRequest {
                parent_id: self.id,
                args,
            })
            .await
            .map_err(|e| graphql_error("post.tags", &e))?
            .unwrap_or_else(Paginated::empty);
        Ok(page.into())
    }

    /// Total number of likes.
    async fn like_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let loaders = ctx.data::<Loaders>()?;
        let count = loaders
            .like_count
            .load_one(self.id)
            .await
            .map_err(|e| graphql_error("post.like_count", &e))?;
        Ok(count.unwrap_or(0))
    }

    /// First page of accounts that liked this post, alphabetical.
    async fn likers(&self, ctx: &Context<'_>, first: Option<i32>) -> Result<UserConnection> {
        let loaders = ctx.data::<Loaders>()?;
        let args = RelationArgs::new(first, OrderDirection::Asc)
            .map_err(|e| graphql_error("post.likers", &e))?;
        let page = loaders
            .likers_by_post
            .load_one(LoadRequest {
                parent_id: self.id,
                args,
            })
            .await
            .map_err(|e| graphql_error("post.likers", &e))?
            .unwrap_or_else(Paginated::empty);
        Ok(page.into())
    }

    /// Whether the given viewer liked this post. The viewer is an
    /// explicit argument; there is no ambient session here.
    async fn liked_by(&self, ctx: &Context<'_>, viewer_id: i64) -> Result<bool> {
        let loaders = ctx.data::<Loaders>()?;
        let liked = loaders
            .viewer_liked
            .load_one(ViewerPost {
                viewer_id,
                post_id: self.id,
            })
            .await
            .map_err(|e| graphql_error("post.liked_by", &e))?;
        Ok(liked.unwrap_or(false))
    }
}

#[ComplexObject]
impl Series {
    /// Series author.
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let loaders = ctx.data::<Loaders>()?;
        let user = loaders
            .users
            .load_one(self.author_id)
            .await
            .map_err(|e| graphql_error("series.author", &e))?;
        Ok(user.map(User::from))
    }

    /// First page of posts in this series.
    async fn posts(
        &self,
        ctx: &Context<'_>,
        first: Option<i32>,
        #[graphql(default)] order: Order,
    ) -> Result<PostConnection> {
        let loaders = ctx.data::<Loaders>()?;
        let args = RelationArgs::new(first, order.into())
            .map_err(|e| graphql_error("series.posts", &e))?;
        let page = loaders
            .posts_by_series
            .load_one(LoadRequest {
                parent_id: self.id,
                args,
            })
            .await
            .map_err(|e| graphql_error("series.posts", &e))?
            .unwrap_or_else(Paginated::empty);
        Ok(page.into())
    }

    /// First page of followers, alphabetical.
    async fn followers(&self, ctx: &Context<'_>, first: Option<i32>) -> Result<UserConnection> {
        let loaders = ctx.data::<Loaders>()?;
        let args = RelationArgs::new(first, OrderDirection::Asc)
            .map_err(|e| graphql_error("series.followers", &e))?;
        let page = loaders
            .followers_by_series
            .load_one(LoadRequest {
                parent_id: self.id,
                args,
            })
            .await
            .map_err(|e| graphql_error("series.followers", &e))?
            .unwrap_or_else(Paginated::empty);
        Ok(page.into())
    }

    /// Total number of followers.
    async fn follower_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let loaders = ctx.data::<Loaders>()?;
        let count = loaders
            .follower_count
            .load_one(self.id)
            .await
            .map_err(|e| graphql_error("series.follower_count", &e))?;
        Ok(count.unwrap_or(0))
    }
}

#[ComplexObject]
impl Comment {
    /// Comment author.
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let loaders = ctx.data::<Loaders>()?;
        let user = loaders
            .users
            .load_one(self.author_id)
            .await
            .map_err(|e| graphql_error("comment.author", &e))?;
        Ok(user.map(User::from))
    }

    /// First page of replies. For later pages use the top-level
    /// `replies` query.
    async fn replies(
        &self,
        ctx: &Context<'_>,
        first: Option<i32>,
        #[graphql(default)] order: Order,
    ) -> Result<ReplyConnection> {
        let loaders = ctx.data::<Loaders>()?;
        let args = RelationArgs::new(first, order.into())
            .map_err(|e| graphql_error("comment.replies", &e))?;
        let page = loaders
            .replies_by_comment
            .load_one(LoadRequest {
                parent_id: self.id,
                args,
            })
            .await
            .map_err(|e| graphql_error("comment.replies", &e))?
            .unwrap_or_else(Paginated::empty);
        Ok(page.into())
    }
}

#[ComplexObject]
impl Reply {
    /// Reply author.
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let loaders = ctx.data::<Loaders>()?;
        let user = loaders
            .users
            .load_one(self.author_id)
            .await
            .map_err(|e| graphql_error("reply.author", &e))?;
        Ok(user.map(User::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazette_core::ports::Cursored;

    fn post(id: i64) -> models::Post {
        models::Post {
            id,
            author_id: 1,
            series_id: None,
            slug: format!("post-{}", id),
            title: "title".into(),
            body: "body".into(),
            published_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_order_conversion() {
        assert_eq!(OrderDirection::from(Order::Asc), OrderDirection::Asc);
        assert_eq!(OrderDirection::from(Order::Desc), OrderDirection::Desc);
        // Le défaut GraphQL suit le défaut du domaine (plus récent d'abord)
        assert_eq!(OrderDirection::from(Order::default()), OrderDirection::default());
    }

    // Test critique: la conversion en connection préserve les deux
    // compteurs et les curseurs dérivés des nœuds
    #[test]
    fn test_connection_conversion_preserves_window() {
        let page = Paginated::from_window(vec![post(10), post(9)], 5, 7, 2);
        let expected_start = page.edges[0].cursor.0.clone();

        let conn = PostConnection::from(page);

        assert_eq!(conn.edges.len(), 2);
        assert_eq!(conn.current_count, 7);
        assert_eq!(conn.previous_count, 5);
        assert!(conn.page_info.has_next_page);
        assert!(conn.page_info.has_previous_page);
        assert_eq!(conn.page_info.start_cursor, Some(expected_start));
        assert_eq!(conn.edges[0].node.id, 10);
    }

    #[test]
    fn test_edge_cursor_matches_node_cursor_field() {
        let p = post(42);
        let expected = gazette_core::ports::Cursor::encode(&p.cursor_value()).0;
        let page = Paginated::from_window(vec![p], 0, 1, 10);
        let conn = PostConnection::from(page);
        assert_eq!(conn.edges[0].cursor, expected);
    }
}
