//! Post repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use contentplan_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::post::{ApprovalState, PostStatus};
use crate::entities::{Post, post};

/// Repository for post operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Find posts of a plan in schedule order.
    pub async fn find_by_plan(&self, plan_id: &str) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::PlanId.eq(plan_id))
            .order_by(post::Column::ScheduledAt, Order::Asc)
            .order_by(post::Column::Id, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record the terminal outcome reported by the publishing collaborator.
    ///
    /// Only lands while the post is still `Scheduled`; a second report
    /// for the same post touches zero rows.
    pub async fn record_outcome(
        &self,
        id: &str,
        outcome: PostStatus,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let changes = post::ActiveModel {
            status: Set(outcome),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let result = Post::update_many()
            .set(changes)
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Status.eq(PostStatus::Scheduled))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Open a review cycle on a post.
    ///
    /// Only lands while the post is not already pending; returns the
    /// number of rows touched.
    pub async fn assign_approver(
        &self,
        id: &str,
        approver_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let changes = post::ActiveModel {
            approval_status: Set(ApprovalState::Pending),
            approver_id: Set(Some(approver_id.to_string())),
            approval_notes: Set(None),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let result = Post::update_many()
            .set(changes)
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::ApprovalStatus.ne(ApprovalState::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Resolve a pending review to `Approved` or `Rejected`.
    ///
    /// Conditional on the post still being pending, so exactly one of
    /// two racing reviewers wins. Returns the number of rows touched.
    pub async fn resolve_approval(
        &self,
        id: &str,
        state: ApprovalState,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let changes = post::ActiveModel {
            approval_status: Set(state),
            approval_notes: Set(notes.map(String::from)),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let result = Post::update_many()
            .set(changes)
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::ApprovalStatus.eq(ApprovalState::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Find pending posts whose plan belongs to a team, oldest first.
    pub async fn find_pending_by_team(
        &self,
        team_id: &str,
        approver_id: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        use crate::entities::plan;

        let mut query = Post::find()
            .inner_join(crate::entities::Plan)
            .filter(plan::Column::TeamId.eq(team_id))
            .filter(post::Column::ApprovalStatus.eq(ApprovalState::Pending));

        if let Some(approver) = approver_id {
            query = query.filter(post::Column::ApproverId.eq(approver));
        }

        query
            .order_by(post::Column::CreatedAt, Order::Asc)
            .order_by(post::Column::Id, Order::Asc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
