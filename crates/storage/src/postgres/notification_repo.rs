//! Notification repository implementation for PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use gazette_core::error::{DomainResult, StorageError, StorageResult};
use gazette_core::models::{Notification, NotificationKind};
use gazette_core::ports::{CursorKind, NotificationRepository, PageArgs, Paginated};

use super::keyset::{KeysetQuery, SqlValue};

pub(crate) const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, kind, topic, message, read, created_at";

/// PostgreSQL implementation of NotificationRepository.
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn list_notifications(
        &self,
        recipient_id: i64,
        page: PageArgs,
    ) -> DomainResult<Paginated<Notification>> {
        KeysetQuery::new("notifications", NOTIFICATION_COLUMNS, "id", CursorKind::Id)
            .filter("recipient_id =", SqlValue::BigInt(recipient_id))
            .fetch_page(&self.pool, &page, NotificationRow::into_notification)
            .await
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Clone, sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    recipient_id: i64,
    kind: String,
    topic: String,
    message: String,
    read: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl NotificationRow {
    fn into_notification(self) -> StorageResult<Notification> {
        let kind = match self.kind.as_str() {
            "comment" => NotificationKind::Comment,
            "reply" => NotificationKind::Reply,
            "like" => NotificationKind::Like,
            "follow" => NotificationKind::Follow,
            other => {
                return Err(StorageError::SerializationError(format!(
                    "notification.kind has unknown value: {}",
                    other
                )))
            }
        };

        Ok(Notification {
            id: self.id,
            recipient_id: self.recipient_id,
            kind,
            topic: self.topic,
            message: self.message,
            read: self.read,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(kind: &str) -> NotificationRow {
        NotificationRow {
            id: 1,
            recipient_id: 2,
            kind: kind.into(),
            topic: "post:42".into(),
            message: "someone commented".into(),
            read: false,
            created_at: Utc::now(),
        }
    }

    // Test critique: une valeur de kind inconnue en base est une erreur
    // de sérialisation explicite, pas un défaut silencieux
    #[test]
    fn test_unknown_kind_rejected() {
        let err = row("shout").into_notification().unwrap_err();
        assert!(err.to_string().contains("shout"));
    }

    #[test]
    fn test_known_kinds_convert() {
        assert_eq!(
            row("reply").into_notification().unwrap().kind,
            NotificationKind::Reply
        );
        assert_eq!(
            row("follow").into_notification().unwrap().kind,
            NotificationKind::Follow
        );
    }
}
