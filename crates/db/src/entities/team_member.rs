//! Team member entity.
//!
//! Team management itself lives in an external service; this table is
//! the locally synchronized membership view used for approver
//! eligibility checks and notification fan-out.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "camelCase")]
pub enum TeamRole {
    /// Regular member.
    #[sea_orm(string_value = "member")]
    Member,
    /// Admin - can manage members.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Owner - full control.
    #[sea_orm(string_value = "owner")]
    Owner,
}

impl Default for TeamRole {
    fn default() -> Self {
        Self::Member
    }
}

/// Team membership - tracks which users belong to which teams.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team_member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The team they belong to.
    #[sea_orm(indexed)]
    pub team_id: String,

    /// The user who is a member.
    #[sea_orm(indexed)]
    pub user_id: String,

    pub role: TeamRole,

    /// Inactive members keep their row but lose approver eligibility.
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub joined_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
