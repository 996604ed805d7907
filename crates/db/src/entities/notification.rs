//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of object a notification points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "camelCase")]
pub enum NotificationObject {
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "plan")]
    Plan,
    #[sea_orm(string_value = "team")]
    Team,
    #[sea_orm(string_value = "invite")]
    Invite,
}

/// Notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    #[sea_orm(string_value = "approvalRequest")]
    ApprovalRequest,
    #[sea_orm(string_value = "approvalResult")]
    ApprovalResult,
    #[sea_orm(string_value = "planCreated")]
    PlanCreated,
    #[sea_orm(string_value = "planPublished")]
    PlanPublished,
    #[sea_orm(string_value = "inviteAccepted")]
    InviteAccepted,
    #[sea_orm(string_value = "teamCreated")]
    TeamCreated,
}

/// A notification row.
///
/// `(recipient_id, object_id, kind)` is the deduplication key: at most
/// one unread row may exist per key, enforced by a partial unique index.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user receiving the notification.
    #[sea_orm(indexed)]
    pub recipient_id: String,

    /// The plan/post/team/invite the notification refers to.
    pub object_id: String,

    pub object_type: NotificationObject,

    pub kind: NotificationKind,

    /// Human-readable summary shown in the notification feed.
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Flipped once by the recipient; never unset.
    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
