//! GraphQL schema definition.
//!
//! This module provides the query root for the publishing graph:
//! paginated top-level lists plus single-entity lookups. Every list
//! shares the keyset pagination contract; object relation fields are
//! resolved through the loader registry wired in at schema build.

use std::sync::Arc;

use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Result, Schema};

use gazette_core::error::DomainResult;
use gazette_core::ports::{PageArgs, PostFilter, RelationStore, Repositories};

use crate::loaders::create_loaders;
use crate::types::{
    graphql_error, Comment, CommentConnection, NotificationConnection, Order, Post,
    PostConnection, ReplyConnection, Series, SeriesConnection, Tag, TagConnection, User,
    UserConnection,
};

// -----------------------------------------------------------------------------
// Schema Configuration
// -----------------------------------------------------------------------------

/// Maximum query depth to prevent deeply nested queries (DoS protection).
/// Note: GraphQL introspection requires depth ~13, so we use 15 to allow it.
pub const MAX_QUERY_DEPTH: usize = 15;

/// Maximum query complexity score (DoS protection).
/// Each field has a default complexity of 1, nested objects multiply.
pub const MAX_QUERY_COMPLEXITY: usize = 500;

/// The Gazette GraphQL schema type.
pub type GazetteSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

// -----------------------------------------------------------------------------
// Schema Builder
// -----------------------------------------------------------------------------

/// Build the GraphQL schema over the given stores.
///
/// Validates the relation registry and constructs the loader set; a
/// miswired relation fails here, before the server accepts traffic.
/// Includes query depth and complexity limits for DoS protection.
pub fn build_schema(
    repositories: Arc<dyn Repositories>,
    relations: Arc<dyn RelationStore>,
) -> DomainResult<GazetteSchema> {
    let loaders = create_loaders(relations)?;

    Ok(Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(repositories)
        .data(loaders)
        .limit_depth(MAX_QUERY_DEPTH)
        .limit_complexity(MAX_QUERY_COMPLEXITY)
        .finish())
}

// -----------------------------------------------------------------------------
// Query Root
// -----------------------------------------------------------------------------

/// Query root for the publishing graph.
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Get a post by slug.
    async fn post<'ctx>(&self, ctx: &Context<'ctx>, slug: String) -> Result<Option<Post>> {
        validate_key_string(&slug, "slug")?;
        let repos = ctx.data::<Arc<dyn Repositories>>()?;

        let post = repos
            .posts()
            .get_post_by_slug(&slug)
            .await
            .map_err(|e| graphql_error("post", &e))?;
        Ok(post.map(Post::from))
    }

    /// List posts with pagination and filtering.
    async fn posts<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        first: Option<i32>,
        after: Option<String>,
        #[graphql(default)] order: Order,
        author_id: Option<i64>,
        series_id: Option<i64>,
        tag: Option<String>,
        published: Option<bool>,
    ) -> Result<PostConnection> {
        if let Some(tag) = &tag {
            validate_key_string(tag, "tag")?;
        }
        let repos = ctx.data::<Arc<dyn Repositories>>()?;

        let filter = PostFilter {
            author_id,
            series_id,
            tag_slug: tag,
            published,
        };
        let page = page_args(first, after.as_deref(), order)?;

        let connection = repos
            .posts()
            .list_posts(filter, page)
            .await
            .map_err(|e| graphql_error("posts", &e))?;
        Ok(connection.into())
    }

    /// Get a series by slug.
    async fn series<'ctx>(&self, ctx: &Context<'ctx>, slug: String) -> Result<Option<Series>> {
        validate_key_string(&slug, "slug")?;
        let repos = ctx.data::<Arc<dyn Repositories>>()?;

        let series = repos
            .series()
            .get_series_by_slug(&slug)
            .await
            .map_err(|e| graphql_error("series", &e))?;
        Ok(series.map(Series::from))
    }

    /// List series with pagination.
    async fn series_list<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        first: Option<i32>,
        after: Option<String>,
        #[graphql(default)] order: Order,
    ) -> Result<SeriesConnection> {
        let repos = ctx.data::<Arc<dyn Repositories>>()?;
        let page = page_args(first, after.as_deref(), order)?;

        let connection = repos
            .series()
            .list_series(page)
            .await
            .map_err(|e| graphql_error("series_list", &e))?;
        Ok(connection.into())
    }

    /// Get a tag by slug.
    async fn tag<'ctx>(&self, ctx: &Context<'ctx>, slug: String) -> Result<Option<Tag>> {
        validate_key_string(&slug, "slug")?;
        let repos = ctx.data::<Arc<dyn Repositories>>()?;

        let tag = repos
            .tags()
            .get_tag_by_slug(&slug)
            .await
            .map_err(|e| graphql_error("tag", &e))?;
        Ok(tag.map(Tag::from))
    }

    /// List tags, alphabetical by slug.
    async fn tags<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        first: Option<i32>,
        after: Option<String>,
    ) -> Result<TagConnection> {
        let repos = ctx.data::<Arc<dyn Repositories>>()?;
        let page = page_args(first, after.as_deref(), Order::Asc)?;

        let connection = repos
            .tags()
            .list_tags(page)
            .await
            .map_err(|e| graphql_error("tags", &e))?;
        Ok(connection.into())
    }

    /// Get a user by username.
    async fn user<'ctx>(&self, ctx: &Context<'ctx>, username: String) -> Result<Option<User>> {
        validate_key_string(&username, "username")?;
        let repos = ctx.data::<Arc<dyn Repositories>>()?;

        let user = repos
            .users()
            .get_user_by_username(&username)
            .await
            .map_err(|e| graphql_error("user", &e))?;
        Ok(user.map(User::from))
    }

    /// List users, alphabetical by username.
    async fn users<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        first: Option<i32>,
        after: Option<String>,
    ) -> Result<UserConnection> {
        let repos = ctx.data::<Arc<dyn Repositories>>()?;
        let page = page_args(first, after.as_deref(), Order::Asc)?;

        let connection = repos
            .users()
            .list_users(page)
            .await
            .map_err(|e| graphql_error("users", &e))?;
        Ok(connection.into())
    }

    /// Get a comment by id.
    async fn comment<'ctx>(&self, ctx: &Context<'ctx>, id: i64) -> Result<Option<Comment>> {
        let repos = ctx.data::<Arc<dyn Repositories>>()?;

        let comment = repos
            .comments()
            .get_comment(id)
            .await
            .map_err(|e| graphql_error("comment", &e))?;
        Ok(comment.map(Comment::from))
    }

    /// List comments on a post with full pagination.
    ///
    /// This is the deep-paging path: the `Post.comments` relation field
    /// serves first pages only.
    async fn comments<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        post_id: i64,
        first: Option<i32>,
        after: Option<String>,
        #[graphql(default)] order: Order,
    ) -> Result<CommentConnection> {
        let repos = ctx.data::<Arc<dyn Repositories>>()?;
        let page = page_args(first, after.as_deref(), order)?;

        let connection = repos
            .comments()
            .list_comments(post_id, page)
            .await
            .map_err(|e| graphql_error("comments", &e))?;
        Ok(connection.into())
    }

    /// List replies to a comment with full pagination.
    async fn replies<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        comment_id: i64,
        first: Option<i32>,
        after: Option<String>,
        #[graphql(default)] order: Order,
    ) -> Result<ReplyConnection> {
        let repos = ctx.data::<Arc<dyn Repositories>>()?;
        let page = page_args(first, after.as_deref(), order)?;

        let connection = repos
            .comments()
            .list_replies(comment_id, page)
            .await
            .map_err(|e| graphql_error("replies", &e))?;
        Ok(connection.into())
    }

    /// List notifications for a recipient, newest first by default.
    async fn notifications<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        recipient_id: i64,
        first: Option<i32>,
        after: Option<String>,
        #[graphql(default)] order: Order,
    ) -> Result<NotificationConnection> {
        let repos = ctx.data::<Arc<dyn Repositories>>()?;
        let page = page_args(first, after.as_deref(), order)?;

        let connection = repos
            .notifications()
            .list_notifications(recipient_id, page)
            .await
            .map_err(|e| graphql_error("notifications", &e))?;
        Ok(connection.into())
    }
}

// -----------------------------------------------------------------------------
// Helpers & Validation
// -----------------------------------------------------------------------------

/// Maximum length for slug/username filter parameters.
const MAX_KEY_LENGTH: usize = 128;

/// Validate and decode pagination arguments before any query runs.
fn page_args(first: Option<i32>, after: Option<&str>, order: Order) -> Result<PageArgs> {
    PageArgs::new(first, after, order.into()).map_err(|e| graphql_error("pagination", &e))
}

/// Validate a slug/username parameter.
fn validate_key_string(s: &str, field_name: &str) -> Result<()> {
    if s.is_empty() {
        return Err(async_graphql::Error::new(format!(
            "{} cannot be empty",
            field_name
        )));
    }
    if s.len() > MAX_KEY_LENGTH {
        return Err(async_graphql::Error::new(format!(
            "{} too long: maximum {} characters allowed",
            field_name, MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazette_core::ports::{CursorValue, Cursor, OrderDirection};

    // Tests de validation critiques - protègent contre les requêtes DoS

    #[test]
    fn test_validate_key_string_boundaries() {
        // Vide = erreur (évite les requêtes inutiles)
        assert!(validate_key_string("", "slug").is_err());
        // Trop long = erreur (DoS prevention)
        assert!(validate_key_string(&"x".repeat(200), "slug").is_err());
        assert!(validate_key_string("a-normal-slug", "slug").is_ok());
    }

    #[test]
    fn test_page_args_rejects_before_query() {
        // Bornes de first: rejet, pas de clamp silencieux
        assert!(page_args(Some(0), None, Order::Desc).is_err());
        assert!(page_args(Some(500), None, Order::Desc).is_err());
        // Curseur malformé: rejet précis
        assert!(page_args(Some(5), Some("!!"), Order::Desc).is_err());
    }

    #[test]
    fn test_page_args_passes_valid_input_through() {
        let cursor = Cursor::encode(&CursorValue::Id(7));
        let page = page_args(Some(5), Some(&cursor.0), Order::Asc).unwrap();
        assert_eq!(page.first, 5);
        assert_eq!(page.after, Some(CursorValue::Id(7)));
        assert_eq!(page.order, OrderDirection::Asc);
    }
}
