//! Scheduled post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub use super::plan::ApprovalState;

/// Publishing status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "camelCase")]
pub enum PostStatus {
    /// Waiting for its scheduled time.
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    /// Delivered by the publishing collaborator.
    #[sea_orm(string_value = "posted")]
    Posted,
    /// The publishing collaborator reported a failure.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// A single schedulable content item belonging to a plan.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning plan; deleting the plan cascades here.
    #[sea_orm(indexed)]
    pub plan_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Slot timestamp the post was assigned to.
    #[sea_orm(indexed)]
    pub scheduled_at: DateTimeWithTimeZone,

    /// External social account references, one broadcast set per batch.
    #[sea_orm(column_type = "JsonBinary")]
    pub social_media_ids: Json,

    #[sea_orm(default_value = false)]
    pub send_reminder: bool,

    pub status: PostStatus,

    pub approval_status: ApprovalState,

    #[sea_orm(nullable)]
    pub approver_id: Option<String>,

    /// Reviewer notes; required when rejected.
    #[sea_orm(nullable)]
    pub approval_notes: Option<String>,

    pub creator_id: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::plan::Entity",
        from = "Column::PlanId",
        to = "super::plan::Column::Id",
        on_delete = "Cascade"
    )]
    Plan,
}

impl Related<super::plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
