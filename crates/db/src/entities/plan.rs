//! Content plan entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "camelCase")]
pub enum PlanStatus {
    /// Editable, not yet materialized into posts.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Published with its posts. Terminal for the plan itself.
    #[sea_orm(string_value = "published")]
    Published,
}

/// Approval workflow state, shared by plans and posts.
///
/// `Pending` can only be entered from `None`, `Approved`, or `Rejected`;
/// `Approved` and `Rejected` are terminal for a single review cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "camelCase")]
pub enum ApprovalState {
    /// No approval requested.
    #[sea_orm(string_value = "none")]
    None,
    /// Waiting for the assigned approver.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Cleared by the approver.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected by the approver; notes carry the reason.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ApprovalState {
    /// Whether a fresh review cycle may be opened from this state.
    #[must_use]
    pub const fn can_reopen(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A titled container of posts spanning a date range.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plan")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// First calendar day covered by the plan (inclusive).
    pub start_date: Date,

    /// Last calendar day covered by the plan (inclusive).
    pub end_date: Date,

    /// Voice/tone setting fed to content generation.
    pub tone: String,

    pub status: PlanStatus,

    pub approval_status: ApprovalState,

    /// Team member currently reviewing, while pending.
    #[sea_orm(nullable)]
    pub approver_id: Option<String>,

    /// Reviewer notes; required when rejected.
    #[sea_orm(nullable)]
    pub approval_notes: Option<String>,

    /// Owning team scope.
    #[sea_orm(indexed)]
    pub team_id: String,

    pub creator_id: String,

    pub created_at: DateTimeWithTimeZone,

    /// Doubles as the optimistic-lock token for draft mutations.
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
