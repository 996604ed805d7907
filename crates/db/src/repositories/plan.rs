//! Plan repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use contentplan_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::plan::{ApprovalState, PlanStatus};
use crate::entities::{Plan, plan, post};

/// Repository for plan operations.
#[derive(Clone)]
pub struct PlanRepository {
    db: Arc<DatabaseConnection>,
}

impl PlanRepository {
    /// Create a new plan repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a plan by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<plan::Model>> {
        Plan::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a plan by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<plan::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PlanNotFound(id.to_string()))
    }

    /// Find plans belonging to a team, newest first.
    pub async fn find_by_team(
        &self,
        team_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<plan::Model>> {
        Plan::find()
            .filter(plan::Column::TeamId.eq(team_id))
            .order_by(plan::Column::CreatedAt, Order::Desc)
            .order_by(plan::Column::Id, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a plan without posts.
    pub async fn create(&self, model: plan::ActiveModel) -> AppResult<plan::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a plan and its posts in a single transaction.
    ///
    /// Either the full plan+posts set is persisted or none of it.
    pub async fn create_with_posts(
        &self,
        plan_model: plan::ActiveModel,
        post_models: Vec<post::ActiveModel>,
    ) -> AppResult<(plan::Model, Vec<post::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created_plan = plan_model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut created_posts = Vec::with_capacity(post_models.len());
        for model in post_models {
            let created = model
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            created_posts.push(created);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((created_plan, created_posts))
    }

    /// Atomically claim a draft for publishing and materialize its posts.
    ///
    /// The status flip is a conditional write: only one of several
    /// racing publishers sees a row touched, and only the winner's
    /// posts are inserted. Everything happens in one transaction, so
    /// either the published plan plus its full post set lands or
    /// nothing does. Returns `None` when the plan was not a claimable
    /// draft (already published, or gone).
    pub async fn publish_with_posts(
        &self,
        id: &str,
        now: DateTime<Utc>,
        post_models: Vec<post::ActiveModel>,
    ) -> AppResult<Option<(plan::Model, Vec<post::Model>)>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let changes = plan::ActiveModel {
            status: Set(PlanStatus::Published),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let claimed = Plan::update_many()
            .set(changes)
            .filter(plan::Column::Id.eq(id))
            .filter(plan::Column::Status.eq(PlanStatus::Draft))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if claimed.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(None);
        }

        let mut created_posts = Vec::with_capacity(post_models.len());
        for model in post_models {
            let created = model
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            created_posts.push(created);
        }

        let published = Plan::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::PlanNotFound(id.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some((published, created_posts)))
    }

    /// Apply draft field updates guarded by the optimistic-lock token.
    ///
    /// The update lands only if the plan is still a draft and its
    /// `updated_at` matches the value the caller read. Returns the
    /// number of rows touched; zero means the caller lost the race or
    /// the plan is no longer a draft.
    pub async fn update_draft(
        &self,
        id: &str,
        expected_updated_at: DateTime<Utc>,
        changes: plan::ActiveModel,
    ) -> AppResult<u64> {
        let result = Plan::update_many()
            .set(changes)
            .filter(plan::Column::Id.eq(id))
            .filter(plan::Column::Status.eq(PlanStatus::Draft))
            .filter(plan::Column::UpdatedAt.eq(expected_updated_at))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Open a review cycle on a plan.
    ///
    /// Only lands while the plan is not already pending; returns the
    /// number of rows touched.
    pub async fn assign_approver(
        &self,
        id: &str,
        approver_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let changes = plan::ActiveModel {
            approval_status: Set(ApprovalState::Pending),
            approver_id: Set(Some(approver_id.to_string())),
            approval_notes: Set(None),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let result = Plan::update_many()
            .set(changes)
            .filter(plan::Column::Id.eq(id))
            .filter(plan::Column::ApprovalStatus.ne(ApprovalState::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Resolve a pending review to `Approved` or `Rejected`.
    ///
    /// Conditional on the plan still being pending, so exactly one of
    /// two racing reviewers wins. Returns the number of rows touched.
    pub async fn resolve_approval(
        &self,
        id: &str,
        state: ApprovalState,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let changes = plan::ActiveModel {
            approval_status: Set(state),
            approval_notes: Set(notes.map(String::from)),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let result = Plan::update_many()
            .set(changes)
            .filter(plan::Column::Id.eq(id))
            .filter(plan::Column::ApprovalStatus.eq(ApprovalState::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Find pending plans in a team, oldest review request first.
    pub async fn find_pending_by_team(
        &self,
        team_id: &str,
        approver_id: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<plan::Model>> {
        let mut query = Plan::find()
            .filter(plan::Column::TeamId.eq(team_id))
            .filter(plan::Column::ApprovalStatus.eq(ApprovalState::Pending));

        if let Some(approver) = approver_id {
            query = query.filter(plan::Column::ApproverId.eq(approver));
        }

        query
            .order_by(plan::Column::CreatedAt, Order::Asc)
            .order_by(plan::Column::Id, Order::Asc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a plan. Child posts go with it via the cascade.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Plan::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
