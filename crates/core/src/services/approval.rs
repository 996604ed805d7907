//! Approval workflow service.
//!
//! One review cycle at a time per item, for both plans and posts. The
//! cycle opens with an approver assignment and resolves to approved or
//! rejected; resolved items can be sent back into review with a fresh
//! assignment.

use chrono::Utc;
use contentplan_common::{AppError, AppResult};
use contentplan_db::entities::notification::{NotificationKind, NotificationObject};
use contentplan_db::entities::plan::ApprovalState;
use contentplan_db::entities::{plan, post};
use contentplan_db::repositories::{PlanRepository, PostRepository, TeamMemberRepository};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

use crate::services::notification::NotificationDispatcher;

/// Reference to an item that can go through review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRef {
    Plan(String),
    Post(String),
}

impl ItemRef {
    fn id(&self) -> &str {
        match self {
            Self::Plan(id) | Self::Post(id) => id,
        }
    }
}

/// A reviewed item with its full row, tagged by type.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "itemType", rename_all = "camelCase")]
pub enum ApprovableItem {
    Plan(plan::Model),
    Post(post::Model),
}

impl ApprovableItem {
    /// Approval state of the underlying row.
    #[must_use]
    pub const fn approval_status(&self) -> ApprovalState {
        match self {
            Self::Plan(p) => p.approval_status,
            Self::Post(p) => p.approval_status,
        }
    }
}

/// Flat review-queue entry, plans and posts merged.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalSummary {
    pub id: String,
    pub item_type: ItemType,
    pub title: String,
    pub creator_id: String,
    pub approver_id: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemType {
    Plan,
    Post,
}

/// Loaded review facts common to plans and posts.
struct LoadedItem {
    object_type: NotificationObject,
    label: &'static str,
    title: String,
    creator_id: String,
    team_id: String,
    approval_status: ApprovalState,
    approver_id: Option<String>,
}

/// Service owning the review cycle for plans and posts.
#[derive(Clone)]
pub struct ApprovalService {
    plan_repo: PlanRepository,
    post_repo: PostRepository,
    team_member_repo: TeamMemberRepository,
    notifications: NotificationDispatcher,
}

impl ApprovalService {
    /// Create a new approval service.
    #[must_use]
    pub const fn new(
        plan_repo: PlanRepository,
        post_repo: PostRepository,
        team_member_repo: TeamMemberRepository,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            plan_repo,
            post_repo,
            team_member_repo,
            notifications,
        }
    }

    /// Open a review cycle by assigning an approver.
    ///
    /// Valid from `none`, `approved`, or `rejected`; an already pending
    /// item yields `AlreadyPending`. The approver must be an active
    /// member of the item's team. A re-assignment after a resolution
    /// starts a clean cycle: previous notes are cleared.
    pub async fn assign_approver(
        &self,
        user_id: &str,
        item: &ItemRef,
        approver_id: &str,
    ) -> AppResult<ApprovableItem> {
        let loaded = self.load(item).await?;
        self.require_member(&loaded.team_id, user_id).await?;

        if !loaded.approval_status.can_reopen() {
            return Err(AppError::AlreadyPending(format!(
                "{} {} already has a pending review",
                loaded.label,
                item.id()
            )));
        }

        if !self
            .team_member_repo
            .is_active_member(&loaded.team_id, approver_id)
            .await?
        {
            return Err(AppError::ApproverNotEligible(format!(
                "User {approver_id} is not an active member of team {}",
                loaded.team_id
            )));
        }

        let now = Utc::now();
        let rows = match item {
            ItemRef::Plan(id) => self.plan_repo.assign_approver(id, approver_id, now).await?,
            ItemRef::Post(id) => self.post_repo.assign_approver(id, approver_id, now).await?,
        };
        if rows == 0 {
            // A concurrent assignment opened the cycle first.
            return Err(AppError::AlreadyPending(format!(
                "{} {} already has a pending review",
                loaded.label,
                item.id()
            )));
        }

        // The assignment is committed at this point; a delivery failure
        // must not undo a successful call.
        if let Err(e) = self
            .notifications
            .dispatch(
                NotificationKind::ApprovalRequest,
                item.id(),
                loaded.object_type,
                &[approver_id.to_string()],
                &format!("Review requested for {} \"{}\"", loaded.label, loaded.title),
            )
            .await
        {
            tracing::warn!(item_id = %item.id(), error = %e, "Failed to notify approver of review request");
        }

        self.reload(item).await
    }

    /// Approve a pending item.
    pub async fn approve(
        &self,
        user_id: &str,
        item: &ItemRef,
        notes: Option<&str>,
    ) -> AppResult<ApprovableItem> {
        self.resolve(user_id, item, ApprovalState::Approved, notes)
            .await
    }

    /// Reject a pending item. Notes are mandatory.
    pub async fn reject(
        &self,
        user_id: &str,
        item: &ItemRef,
        notes: &str,
    ) -> AppResult<ApprovableItem> {
        if notes.trim().is_empty() {
            return Err(AppError::Validation(
                "Rejection notes must not be empty".to_string(),
            ));
        }

        self.resolve(user_id, item, ApprovalState::Rejected, Some(notes))
            .await
    }

    async fn resolve(
        &self,
        user_id: &str,
        item: &ItemRef,
        state: ApprovalState,
        notes: Option<&str>,
    ) -> AppResult<ApprovableItem> {
        let loaded = self.load(item).await?;

        if loaded.approval_status != ApprovalState::Pending {
            return Err(AppError::InvalidTransition(format!(
                "{} {} has no pending review",
                loaded.label,
                item.id()
            )));
        }
        if loaded.approver_id.as_deref() != Some(user_id) {
            return Err(AppError::Forbidden(
                "Only the assigned approver can resolve this review".to_string(),
            ));
        }

        let now = Utc::now();
        let rows = match item {
            ItemRef::Plan(id) => self.plan_repo.resolve_approval(id, state, notes, now).await?,
            ItemRef::Post(id) => self.post_repo.resolve_approval(id, state, notes, now).await?,
        };
        if rows == 0 {
            // A concurrent resolution landed first.
            return Err(AppError::InvalidTransition(format!(
                "{} {} has no pending review",
                loaded.label,
                item.id()
            )));
        }

        let verdict = match state {
            ApprovalState::Approved => "approved",
            _ => "rejected",
        };
        // Resolution is committed; notify best-effort only.
        if let Err(e) = self
            .notifications
            .dispatch(
                NotificationKind::ApprovalResult,
                item.id(),
                loaded.object_type,
                &[loaded.creator_id.clone()],
                &format!("{} \"{}\" was {verdict}", loaded.label, loaded.title),
            )
            .await
        {
            tracing::warn!(item_id = %item.id(), error = %e, "Failed to notify creator of review verdict");
        }

        self.reload(item).await
    }

    /// List the pending review queue of a team.
    ///
    /// Plans and posts are merged into a single queue ordered by review
    /// request time, oldest first, ties broken by ID. Optionally scoped
    /// to one approver.
    pub async fn list_pending(
        &self,
        user_id: &str,
        team_id: &str,
        approver_id: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<ApprovalSummary>> {
        self.require_member(team_id, user_id).await?;

        // Over-fetch both streams so the merged window is complete.
        let fetch = offset.saturating_add(limit);
        let plans = self
            .plan_repo
            .find_pending_by_team(team_id, approver_id, fetch, 0)
            .await?;
        let posts = self
            .post_repo
            .find_pending_by_team(team_id, approver_id, fetch, 0)
            .await?;

        let plans = plans.into_iter().map(|p| ApprovalSummary {
            id: p.id,
            item_type: ItemType::Plan,
            title: p.title,
            creator_id: p.creator_id,
            approver_id: p.approver_id,
            created_at: p.created_at,
        });
        let posts = posts.into_iter().map(|p| ApprovalSummary {
            id: p.id,
            item_type: ItemType::Post,
            title: p.title,
            creator_id: p.creator_id,
            approver_id: p.approver_id,
            created_at: p.created_at,
        });

        Ok(merge_queues(plans.collect(), posts.collect(), limit, offset))
    }

    async fn load(&self, item: &ItemRef) -> AppResult<LoadedItem> {
        match item {
            ItemRef::Plan(id) => {
                let plan = self.plan_repo.get_by_id(id).await?;
                Ok(LoadedItem {
                    object_type: NotificationObject::Plan,
                    label: "Plan",
                    title: plan.title,
                    creator_id: plan.creator_id,
                    team_id: plan.team_id,
                    approval_status: plan.approval_status,
                    approver_id: plan.approver_id,
                })
            }
            ItemRef::Post(id) => {
                let post = self.post_repo.get_by_id(id).await?;
                let plan = self.plan_repo.get_by_id(&post.plan_id).await?;
                Ok(LoadedItem {
                    object_type: NotificationObject::Post,
                    label: "Post",
                    title: post.title,
                    creator_id: post.creator_id,
                    team_id: plan.team_id,
                    approval_status: post.approval_status,
                    approver_id: post.approver_id,
                })
            }
        }
    }

    async fn reload(&self, item: &ItemRef) -> AppResult<ApprovableItem> {
        match item {
            ItemRef::Plan(id) => Ok(ApprovableItem::Plan(self.plan_repo.get_by_id(id).await?)),
            ItemRef::Post(id) => Ok(ApprovableItem::Post(self.post_repo.get_by_id(id).await?)),
        }
    }

    async fn require_member(&self, team_id: &str, user_id: &str) -> AppResult<()> {
        if self
            .team_member_repo
            .is_active_member(team_id, user_id)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Not an active member of this team".to_string(),
            ))
        }
    }
}

/// Merge two queues already sorted by `(created_at, id)` and apply the
/// page window.
fn merge_queues(
    plans: Vec<ApprovalSummary>,
    posts: Vec<ApprovalSummary>,
    limit: u64,
    offset: u64,
) -> Vec<ApprovalSummary> {
    let mut merged = Vec::with_capacity(plans.len() + posts.len());
    merged.extend(plans);
    merged.extend(posts);
    merged.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));

    merged
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate};
    use contentplan_db::entities::plan::PlanStatus;
    use contentplan_db::repositories::NotificationRepository;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, Value};
    use std::sync::Arc;

    fn service(db: Arc<DatabaseConnection>) -> ApprovalService {
        ApprovalService::new(
            PlanRepository::new(Arc::clone(&db)),
            PostRepository::new(Arc::clone(&db)),
            TeamMemberRepository::new(Arc::clone(&db)),
            NotificationDispatcher::new(NotificationRepository::new(db)),
        )
    }

    fn test_plan(id: &str, approval: ApprovalState, approver: Option<&str>) -> plan::Model {
        plan::Model {
            id: id.to_string(),
            title: "January plan".to_string(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            tone: "casual".to_string(),
            status: PlanStatus::Published,
            approval_status: approval,
            approver_id: approver.map(String::from),
            approval_notes: None,
            team_id: "team1".to_string(),
            creator_id: "creator".to_string(),
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    fn member_count(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
        btreemap! { "num_items" => Value::BigInt(Some(n)) }
    }

    fn summary(id: &str, item_type: ItemType, created_at: &str) -> ApprovalSummary {
        ApprovalSummary {
            id: id.to_string(),
            item_type,
            title: "Item".to_string(),
            creator_id: "creator".to_string(),
            approver_id: Some("reviewer".to_string()),
            created_at: DateTime::parse_from_rfc3339(created_at).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_reject_requires_notes() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);

        let result = svc
            .reject("reviewer", &ItemRef::Plan("plan1".to_string()), "   ")
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_assign_rejects_approver_outside_team() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_plan("plan1", ApprovalState::None, None)]])
                .append_query_results([[member_count(1)], [member_count(0)]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc
            .assign_approver("creator", &ItemRef::Plan("plan1".to_string()), "outsider")
            .await;
        assert!(matches!(result, Err(AppError::ApproverNotEligible(_))));
    }

    #[tokio::test]
    async fn test_assign_on_pending_item_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_plan(
                    "plan1",
                    ApprovalState::Pending,
                    Some("reviewer"),
                )]])
                .append_query_results([[member_count(1)]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc
            .assign_approver("creator", &ItemRef::Plan("plan1".to_string()), "reviewer")
            .await;
        assert!(matches!(result, Err(AppError::AlreadyPending(_))));
    }

    #[tokio::test]
    async fn test_approve_by_unassigned_user_is_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_plan(
                    "plan1",
                    ApprovalState::Pending,
                    Some("reviewer"),
                )]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc
            .approve("somebody-else", &ItemRef::Plan("plan1".to_string()), None)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_approve_race_loser_sees_invalid_transition() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_plan(
                    "plan1",
                    ApprovalState::Pending,
                    Some("reviewer"),
                )]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc
            .approve("reviewer", &ItemRef::Plan("plan1".to_string()), None)
            .await;
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_approve_survives_notification_failure() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_plan(
                    "plan1",
                    ApprovalState::Pending,
                    Some("reviewer"),
                )]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_errors([DbErr::Custom("notification store is down".to_string())])
                .append_query_results([[test_plan(
                    "plan1",
                    ApprovalState::Approved,
                    Some("reviewer"),
                )]])
                .into_connection(),
        );
        let svc = service(db);

        let item = svc
            .approve("reviewer", &ItemRef::Plan("plan1".to_string()), None)
            .await
            .unwrap();
        assert_eq!(item.approval_status(), ApprovalState::Approved);
    }

    #[test]
    fn test_merge_orders_by_request_time_then_id() {
        let plans = vec![
            summary("a", ItemType::Plan, "2024-01-01T10:00:00Z"),
            summary("d", ItemType::Plan, "2024-01-03T10:00:00Z"),
        ];
        let posts = vec![
            summary("b", ItemType::Post, "2024-01-01T10:00:00Z"),
            summary("c", ItemType::Post, "2024-01-02T10:00:00Z"),
        ];

        let merged = merge_queues(plans, posts, 10, 0);
        let ids: Vec<&str> = merged.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_merge_applies_page_window() {
        let plans = vec![
            summary("a", ItemType::Plan, "2024-01-01T10:00:00Z"),
            summary("c", ItemType::Plan, "2024-01-03T10:00:00Z"),
        ];
        let posts = vec![summary("b", ItemType::Post, "2024-01-02T10:00:00Z")];

        let merged = merge_queues(plans, posts, 1, 1);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "b");
    }
}
