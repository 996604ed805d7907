//! Push/email delivery client.
//!
//! Thin client for the external push/email collaborator. Delivery is a
//! best-effort mirror of the durable notification rows: the dispatcher
//! logs failures and moves on, it never rolls back the transition that
//! triggered the notification.

use std::time::Duration;

use contentplan_common::config::PushConfig;
use contentplan_common::{AppError, AppResult};
use contentplan_db::entities::notification;
use serde::Serialize;
use url::Url;

/// Payload sent to the delivery collaborator.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushPayload<'a> {
    recipient_user_id: &'a str,
    notification_id: &'a str,
    kind: notification::NotificationKind,
    object_type: notification::NotificationObject,
    object_id: &'a str,
    description: &'a str,
    created_at: String,
}

/// Client for the external push/email delivery service.
#[derive(Clone)]
pub struct PushDeliveryService {
    client: reqwest::Client,
    endpoint: Url,
}

impl PushDeliveryService {
    /// Build the client from configuration.
    ///
    /// Returns `None` when no endpoint is configured; the dispatcher
    /// then skips the push mirror entirely.
    pub fn from_config(config: &PushConfig) -> AppResult<Option<Self>> {
        let Some(ref endpoint) = config.endpoint else {
            return Ok(None);
        };

        let endpoint = Url::parse(endpoint)
            .map_err(|e| AppError::Config(format!("Invalid push endpoint: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build push client: {e}")))?;

        Ok(Some(Self { client, endpoint }))
    }

    /// Deliver one notification to one recipient.
    ///
    /// Bounded by the configured timeout; a non-2xx response or
    /// transport error surfaces as `ExternalService`.
    pub async fn send(&self, n: &notification::Model) -> AppResult<()> {
        let payload = PushPayload {
            recipient_user_id: &n.recipient_id,
            notification_id: &n.id,
            kind: n.kind,
            object_type: n.object_type,
            object_id: &n.object_id,
            description: &n.description,
            created_at: n.created_at.to_rfc3339(),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Push delivery failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Push delivery returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
