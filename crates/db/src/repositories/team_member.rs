//! Team member repository.
//!
//! Backs the `isActiveMember` contract consumed by the approval
//! workflow, plus the recipient list for team-wide notifications.

use std::sync::Arc;

use contentplan_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

use crate::entities::{TeamMember, team_member};

/// Repository for team membership lookups.
#[derive(Clone)]
pub struct TeamMemberRepository {
    db: Arc<DatabaseConnection>,
}

impl TeamMemberRepository {
    /// Create a new team member repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check whether a user is an active member of a team.
    pub async fn is_active_member(&self, team_id: &str, user_id: &str) -> AppResult<bool> {
        let count = TeamMember::find()
            .filter(team_member::Column::TeamId.eq(team_id))
            .filter(team_member::Column::UserId.eq(user_id))
            .filter(team_member::Column::IsActive.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// List the user IDs of all active members of a team.
    pub async fn list_active_member_ids(&self, team_id: &str) -> AppResult<Vec<String>> {
        let members = TeamMember::find()
            .filter(team_member::Column::TeamId.eq(team_id))
            .filter(team_member::Column::IsActive.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(members.into_iter().map(|m| m.user_id).collect())
    }

    /// Record a membership row (synchronized from the team service).
    pub async fn create(&self, model: team_member::ActiveModel) -> AppResult<team_member::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
