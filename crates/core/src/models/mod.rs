//! Domain models for the publishing graph.
//!
//! These models are storage-agnostic and represent the canonical form of
//! published content within the domain layer. Relations are carried as ids
//! (`author_id`, `post_id`, ...), never as owning object references; the
//! resolution layer hydrates related entities through the loader machinery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Accounts
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Unique handle, used as the alphabetical cursor key for user lists.
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Published Content
// =============================================================================

/// A named sequence of posts by one author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: i64,
    pub author_id: i64,
    /// Unique URL slug.
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A published post, optionally part of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub series_id: Option<i64>,
    /// Unique URL slug.
    pub slug: String,
    pub title: String,
    pub body: String,
    /// None while the post is still a draft.
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A top-level comment on a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A reply to a comment. Replies do not nest further.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: i64,
    pub comment_id: i64,
    pub author_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A content tag, attached to posts through the `post_tags` pivot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    /// Unique slug, used as the alphabetical cursor key for tag lists.
    pub slug: String,
    pub name: String,
}

// =============================================================================
// Notifications
// =============================================================================

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Comment,
    Reply,
    Like,
    Follow,
}

/// A notification delivered to one account.
///
/// `topic` is the deterministic per-resource identifier the external
/// fan-out collaborator publishes under (e.g. `post:42`); this layer
/// treats it as an opaque string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub kind: NotificationKind,
    pub topic: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test critique: le format sérialisé des kinds est stable
    // (les consommateurs externes filtrent sur ces valeurs)
    #[test]
    fn test_notification_kind_serde_format() {
        let json = serde_json::to_string(&NotificationKind::Reply).unwrap();
        assert_eq!(json, "\"reply\"");

        let parsed: NotificationKind = serde_json::from_str("\"follow\"").unwrap();
        assert_eq!(parsed, NotificationKind::Follow);
    }
}
