//! Notification dispatcher.
//!
//! Fans out notifications for lifecycle and approval transitions,
//! deduplicating per `(recipient, object, kind)` key, and mirrors each
//! durable row to the push/email collaborator on a best-effort basis.

use contentplan_common::{AppResult, IdGenerator};
use contentplan_db::{
    entities::notification::{self, NotificationKind, NotificationObject},
    repositories::NotificationRepository,
};
use sea_orm::Set;

use crate::services::push_delivery::PushDeliveryService;

/// Notification dispatcher for transition side effects.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notification_repo: NotificationRepository,
    push: Option<PushDeliveryService>,
    id_gen: IdGenerator,
}

impl NotificationDispatcher {
    /// Create a new dispatcher without a push mirror.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            push: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Attach the push/email delivery client.
    pub fn set_push_delivery(&mut self, push: PushDeliveryService) {
        self.push = Some(push);
    }

    /// Dispatch a notification to each recipient.
    ///
    /// The dedup key is `(recipient, object_id, kind)`: while an unread
    /// row exists for the key, a repeat dispatch refreshes it instead
    /// of inserting a duplicate. Push delivery happens after the row is
    /// durable; its failure is logged and never propagated.
    pub async fn dispatch(
        &self,
        kind: NotificationKind,
        object_id: &str,
        object_type: NotificationObject,
        recipient_ids: &[String],
        description: &str,
    ) -> AppResult<Vec<notification::Model>> {
        let mut created = Vec::with_capacity(recipient_ids.len());

        for recipient_id in recipient_ids {
            let model = notification::ActiveModel {
                id: Set(self.id_gen.generate()),
                recipient_id: Set(recipient_id.clone()),
                object_id: Set(object_id.to_string()),
                object_type: Set(object_type),
                kind: Set(kind),
                description: Set(description.to_string()),
                is_read: Set(false),
                created_at: Set(chrono::Utc::now().into()),
            };

            let notification = self.notification_repo.upsert_unread(model).await?;

            if let Some(ref push) = self.push
                && let Err(e) = push.send(&notification).await
            {
                tracing::warn!(
                    error = %e,
                    recipient_id = %recipient_id,
                    notification_id = %notification.id,
                    "Failed to deliver push notification"
                );
            }

            created.push(notification);
        }

        Ok(created)
    }

    /// Get notifications for a user.
    pub async fn get_notifications(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_user(user_id, limit, until_id, unread_only)
            .await
    }

    /// Mark a notification as read. A no-op when already read.
    pub async fn mark_as_read(&self, user_id: &str, notification_id: &str) -> AppResult<()> {
        // Verify the notification belongs to the user
        let notification = self.notification_repo.find_by_id(notification_id).await?;
        if let Some(n) = notification
            && n.recipient_id == user_id
        {
            self.notification_repo.mark_as_read(notification_id).await?;
        }
        Ok(())
    }

    /// Mark all notifications as read for a user.
    pub async fn mark_all_as_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_notification(id: &str, recipient: &str, is_read: bool) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            recipient_id: recipient.to_string(),
            object_id: "plan1".to_string(),
            object_type: NotificationObject::Plan,
            kind: NotificationKind::PlanPublished,
            description: "Plan published".to_string(),
            is_read,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_returns_one_row_per_recipient() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    [test_notification("n1", "user1", false)],
                    [test_notification("n2", "user2", false)],
                ])
                .into_connection(),
        );

        let dispatcher = NotificationDispatcher::new(NotificationRepository::new(db));
        let rows = dispatcher
            .dispatch(
                NotificationKind::PlanPublished,
                "plan1",
                NotificationObject::Plan,
                &["user1".to_string(), "user2".to_string()],
                "Plan published",
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].recipient_id, "user1");
        assert_eq!(rows[1].recipient_id, "user2");
    }

    #[tokio::test]
    async fn test_mark_as_read_ignores_foreign_notification() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_notification("n1", "owner", false)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let dispatcher = NotificationDispatcher::new(NotificationRepository::new(db));

        // Different user: silently skipped, no update issued.
        dispatcher.mark_as_read("intruder", "n1").await.unwrap();
    }
}
