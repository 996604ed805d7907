//! Plan lifecycle service.
//!
//! Owns the `draft -> published` plan state machine and the
//! materialization of post drafts beneath a plan. Post status beyond
//! `scheduled` is driven by the external publishing collaborator and
//! only recorded here.

use chrono::{NaiveDate, Utc};
use contentplan_common::{AppError, AppResult, IdGenerator};
use contentplan_db::entities::plan::{ApprovalState, PlanStatus};
use contentplan_db::entities::post::PostStatus;
use contentplan_db::entities::{plan, post};
use contentplan_db::repositories::{PlanRepository, PostRepository, TeamMemberRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::notification::NotificationDispatcher;
use crate::services::schedule::{ContentItem, PostDraft, WeeklyPattern, assign_content, generate_slots};
use contentplan_db::entities::notification::{NotificationKind, NotificationObject};

/// Input for creating a plan.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(max = 64))]
    pub tone: String,
    pub status: PlanStatus,
    pub team_id: String,
    /// Weekly recurring slot pattern; only used when publishing.
    #[serde(default)]
    pub pattern: WeeklyPattern,
    /// Generated content items in generation order.
    #[serde(default)]
    pub content: Vec<ContentItem>,
    /// Broadcast account set applied to every post in the batch.
    #[serde(default)]
    pub social_media_ids: Vec<String>,
}

/// Input for publishing an existing draft.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PublishInput {
    #[serde(default)]
    pub pattern: WeeklyPattern,
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default)]
    pub social_media_ids: Vec<String>,
}

/// Input for updating a draft plan.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDraftInput {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(length(max = 64))]
    pub tone: Option<String>,
}

/// Terminal outcome reported by the publishing collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PostOutcome {
    Posted,
    Failed,
}

impl PostOutcome {
    const fn status(self) -> PostStatus {
        match self {
            Self::Posted => PostStatus::Posted,
            Self::Failed => PostStatus::Failed,
        }
    }
}

/// Service owning the plan/post lifecycle.
#[derive(Clone)]
pub struct PlanService {
    plan_repo: PlanRepository,
    post_repo: PostRepository,
    team_member_repo: TeamMemberRepository,
    notifications: NotificationDispatcher,
    id_gen: IdGenerator,
}

impl PlanService {
    /// Create a new plan service.
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
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a plan, as a draft or directly published.
    ///
    /// A draft carries zero posts. Publishing expands the date range
    /// and pattern into slots, pairs them with the content items, and
    /// persists the plan plus its posts in one transaction.
    pub async fn create(
        &self,
        user_id: &str,
        input: CreatePlanInput,
    ) -> AppResult<(plan::Model, Vec<post::Model>)> {
        input.validate()?;

        // Pure range/pattern checks come before any database work so a
        // bad request never partially commits.
        let slots = generate_slots(input.start_date, input.end_date, &input.pattern)?;

        if !self
            .team_member_repo
            .is_active_member(&input.team_id, user_id)
            .await?
        {
            return Err(AppError::Forbidden(
                "Not an active member of this team".to_string(),
            ));
        }

        let now = Utc::now();
        let plan_id = self.id_gen.generate();
        let plan_model = plan::ActiveModel {
            id: Set(plan_id.clone()),
            title: Set(input.title),
            description: Set(input.description),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            tone: Set(input.tone),
            status: Set(input.status),
            approval_status: Set(ApprovalState::None),
            approver_id: Set(None),
            approval_notes: Set(None),
            team_id: Set(input.team_id.clone()),
            creator_id: Set(user_id.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        match input.status {
            PlanStatus::Draft => {
                let created = self.plan_repo.create(plan_model).await?;
                Ok((created, Vec::new()))
            }
            PlanStatus::Published => {
                let drafts = assign_content(&slots, input.content, &input.social_media_ids);
                let post_models = self.materialize(&plan_id, user_id, drafts);
                let (created_plan, created_posts) = self
                    .plan_repo
                    .create_with_posts(plan_model, post_models)
                    .await?;

                self.notify_team(
                    &created_plan,
                    NotificationKind::PlanCreated,
                    &format!("Content plan \"{}\" was created", created_plan.title),
                )
                .await;

                Ok((created_plan, created_posts))
            }
        }
    }

    /// Publish a draft plan, materializing its posts.
    ///
    /// Valid only while the plan is a draft; a published plan yields
    /// `InvalidTransition`. Concurrent publishers are serialized by a
    /// conditional status flip, so exactly one wins.
    pub async fn publish_draft(
        &self,
        user_id: &str,
        plan_id: &str,
        input: PublishInput,
    ) -> AppResult<(plan::Model, Vec<post::Model>)> {
        let existing = self.plan_repo.get_by_id(plan_id).await?;
        self.require_member(&existing.team_id, user_id).await?;

        if existing.status == PlanStatus::Published {
            return Err(AppError::InvalidTransition(format!(
                "Plan {plan_id} is already published"
            )));
        }

        let slots = generate_slots(existing.start_date, existing.end_date, &input.pattern)?;
        let drafts = assign_content(&slots, input.content, &input.social_media_ids);
        let post_models = self.materialize(plan_id, &existing.creator_id, drafts);

        let Some((published, posts)) = self
            .plan_repo
            .publish_with_posts(plan_id, Utc::now(), post_models)
            .await?
        else {
            // The claim touched nothing: somebody got there first.
            return match self.plan_repo.find_by_id(plan_id).await? {
                None => Err(AppError::PlanNotFound(plan_id.to_string())),
                Some(p) if p.status == PlanStatus::Published => Err(AppError::InvalidTransition(
                    format!("Plan {plan_id} is already published"),
                )),
                Some(_) => Err(AppError::ConcurrentModification(format!(
                    "Plan {plan_id} changed underneath this publish"
                ))),
            };
        };

        self.notify_team(
            &published,
            NotificationKind::PlanPublished,
            &format!("Content plan \"{}\" was published", published.title),
        )
        .await;

        Ok((published, posts))
    }

    /// Update draft fields under the optimistic lock.
    pub async fn update_draft(
        &self,
        user_id: &str,
        plan_id: &str,
        input: UpdateDraftInput,
    ) -> AppResult<plan::Model> {
        input.validate()?;

        let existing = self.plan_repo.get_by_id(plan_id).await?;
        if existing.creator_id != user_id {
            return Err(AppError::Forbidden(
                "Not the creator of this plan".to_string(),
            ));
        }
        if existing.status != PlanStatus::Draft {
            return Err(AppError::InvalidTransition(format!(
                "Plan {plan_id} is not a draft"
            )));
        }

        let new_start = input.start_date.unwrap_or(existing.start_date);
        let new_end = input.end_date.unwrap_or(existing.end_date);
        if new_end < new_start {
            return Err(AppError::InvalidRange(format!(
                "end date {new_end} is before start date {new_start}"
            )));
        }

        let mut changes = plan::ActiveModel {
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        if let Some(title) = input.title {
            changes.title = Set(title);
        }
        if let Some(description) = input.description {
            changes.description = Set(description);
        }
        if let Some(start_date) = input.start_date {
            changes.start_date = Set(start_date);
        }
        if let Some(end_date) = input.end_date {
            changes.end_date = Set(end_date);
        }
        if let Some(tone) = input.tone {
            changes.tone = Set(tone);
        }

        let rows = self
            .plan_repo
            .update_draft(
                plan_id,
                existing.updated_at.with_timezone(&Utc),
                changes,
            )
            .await?;

        if rows == 0 {
            // Lost the race: work out against what.
            return match self.plan_repo.find_by_id(plan_id).await? {
                None => Err(AppError::PlanNotFound(plan_id.to_string())),
                Some(p) if p.status != PlanStatus::Draft => Err(AppError::InvalidTransition(
                    format!("Plan {plan_id} is not a draft"),
                )),
                Some(_) => Err(AppError::ConcurrentModification(format!(
                    "Plan {plan_id} was modified concurrently; retry with fresh data"
                ))),
            };
        }

        self.plan_repo.get_by_id(plan_id).await
    }

    /// Delete a plan and, via the cascade, all of its posts.
    pub async fn delete(&self, user_id: &str, plan_id: &str) -> AppResult<()> {
        let existing = self.plan_repo.get_by_id(plan_id).await?;
        if existing.creator_id != user_id {
            return Err(AppError::Forbidden(
                "Not the creator of this plan".to_string(),
            ));
        }

        self.plan_repo.delete(plan_id).await?;
        Ok(())
    }

    /// Get a plan with its posts in schedule order.
    pub async fn get_with_posts(
        &self,
        user_id: &str,
        plan_id: &str,
    ) -> AppResult<(plan::Model, Vec<post::Model>)> {
        let plan = self.plan_repo.get_by_id(plan_id).await?;
        self.require_member(&plan.team_id, user_id).await?;

        let posts = self.post_repo.find_by_plan(plan_id).await?;
        Ok((plan, posts))
    }

    /// List a team's plans, newest first.
    pub async fn list_for_team(
        &self,
        user_id: &str,
        team_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<plan::Model>> {
        self.require_member(team_id, user_id).await?;
        self.plan_repo.find_by_team(team_id, limit, offset).await
    }

    /// Record the terminal outcome reported by the publishing
    /// collaborator. A repeat report for the same post is rejected.
    pub async fn report_post_outcome(
        &self,
        post_id: &str,
        outcome: PostOutcome,
    ) -> AppResult<post::Model> {
        let rows = self
            .post_repo
            .record_outcome(post_id, outcome.status(), Utc::now())
            .await?;

        if rows == 0 {
            // Row exists but is no longer `scheduled`, or never existed.
            let post = self.post_repo.get_by_id(post_id).await?;
            return Err(AppError::InvalidTransition(format!(
                "Post {post_id} already has outcome {:?}",
                post.status
            )));
        }

        self.post_repo.get_by_id(post_id).await
    }

    /// Build post active models out of assigned drafts.
    fn materialize(
        &self,
        plan_id: &str,
        creator_id: &str,
        drafts: Vec<PostDraft>,
    ) -> Vec<post::ActiveModel> {
        let now = Utc::now();
        drafts
            .into_iter()
            .map(|draft| post::ActiveModel {
                id: Set(self.id_gen.generate()),
                plan_id: Set(plan_id.to_string()),
                title: Set(draft.title),
                content: Set(draft.content),
                scheduled_at: Set(draft.scheduled_at.into()),
                social_media_ids: Set(serde_json::json!(draft.social_media_ids)),
                send_reminder: Set(draft.send_reminder),
                status: Set(PostStatus::Scheduled),
                approval_status: Set(ApprovalState::None),
                approver_id: Set(None),
                approval_notes: Set(None),
                creator_id: Set(creator_id.to_string()),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            })
            .collect()
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

    /// Fan a plan transition out to every active team member.
    ///
    /// Runs after the transition has committed, so a delivery failure
    /// must not turn the successful call into an error. Failures are
    /// logged and swallowed.
    async fn notify_team(&self, plan: &plan::Model, kind: NotificationKind, description: &str) {
        let result = async {
            let recipients = self
                .team_member_repo
                .list_active_member_ids(&plan.team_id)
                .await?;

            self.notifications
                .dispatch(
                    kind,
                    &plan.id,
                    NotificationObject::Plan,
                    &recipients,
                    description,
                )
                .await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(plan_id = %plan.id, error = %e, "Failed to notify team of plan transition");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contentplan_db::repositories::NotificationRepository;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, Value};
    use std::sync::Arc;

    fn service(db: Arc<DatabaseConnection>) -> PlanService {
        PlanService::new(
            PlanRepository::new(Arc::clone(&db)),
            PostRepository::new(Arc::clone(&db)),
            TeamMemberRepository::new(Arc::clone(&db)),
            NotificationDispatcher::new(NotificationRepository::new(db)),
        )
    }

    fn test_plan(id: &str, status: PlanStatus) -> plan::Model {
        plan::Model {
            id: id.to_string(),
            title: "January plan".to_string(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            tone: "casual".to_string(),
            status,
            approval_status: ApprovalState::None,
            approver_id: None,
            approval_notes: None,
            team_id: "team1".to_string(),
            creator_id: "creator".to_string(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn test_post(id: &str, status: PostStatus) -> post::Model {
        post::Model {
            id: id.to_string(),
            plan_id: "plan1".to_string(),
            title: "Post".to_string(),
            content: "Body".to_string(),
            scheduled_at: Utc::now().into(),
            social_media_ids: serde_json::json!([]),
            send_reminder: false,
            status,
            approval_status: ApprovalState::None,
            approver_id: None,
            approval_notes: None,
            creator_id: "creator".to_string(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn member_count(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
        btreemap! { "num_items" => Value::BigInt(Some(n)) }
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_range() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);

        let input = CreatePlanInput {
            title: "Plan".to_string(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            tone: "casual".to_string(),
            status: PlanStatus::Draft,
            team_id: "team1".to_string(),
            pattern: WeeklyPattern::default(),
            content: vec![],
            social_media_ids: vec![],
        };

        let result = svc.create("creator", input).await;
        assert!(matches!(result, Err(AppError::InvalidRange(_))));
    }

    #[tokio::test]
    async fn test_create_published_survives_notification_failure() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member_count(1)]])
                .append_query_results([[test_plan("plan1", PlanStatus::Published)]])
                .append_query_errors([DbErr::Custom("notification store is down".to_string())])
                .into_connection(),
        );
        let svc = service(db);

        let input = CreatePlanInput {
            title: "Plan".to_string(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            tone: "casual".to_string(),
            status: PlanStatus::Published,
            team_id: "team1".to_string(),
            pattern: WeeklyPattern::default(),
            content: vec![],
            social_media_ids: vec![],
        };

        let (plan, posts) = svc.create("creator", input).await.unwrap();
        assert_eq!(plan.id, "plan1");
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_update_draft_rejects_published_plan() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_plan("plan1", PlanStatus::Published)]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc
            .update_draft("creator", "plan1", UpdateDraftInput::default())
            .await;
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_update_draft_rejects_non_creator() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_plan("plan1", PlanStatus::Draft)]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc
            .update_draft("somebody-else", "plan1", UpdateDraftInput::default())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_draft_conflict_maps_to_concurrent_modification() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_plan("plan1", PlanStatus::Draft)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([[test_plan("plan1", PlanStatus::Draft)]])
                .into_connection(),
        );
        let svc = service(db);

        let input = UpdateDraftInput {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let result = svc.update_draft("creator", "plan1", input).await;
        assert!(matches!(result, Err(AppError::ConcurrentModification(_))));
    }

    #[tokio::test]
    async fn test_report_outcome_twice_is_invalid_transition() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([[test_post("post1", PostStatus::Posted)]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc.report_post_outcome("post1", PostOutcome::Failed).await;
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }
}
