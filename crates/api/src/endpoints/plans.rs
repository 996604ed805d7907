//! Plan lifecycle endpoints.

use axum::{Json, Router, extract::State, routing::post};
use chrono::NaiveDate;
use contentplan_common::AppResult;
use contentplan_core::services::plan::{CreatePlanInput, PublishInput, UpdateDraftInput};
use contentplan_core::services::schedule::{ContentItem, WeeklyPattern};
use contentplan_db::entities::plan::{self, ApprovalState, PlanStatus};
use contentplan_db::entities::post;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

// ==================== Request/Response Types ====================

/// Plan response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub tone: String,
    pub status: PlanStatus,
    pub approval_status: ApprovalState,
    pub approver_id: Option<String>,
    pub approval_notes: Option<String>,
    pub team_id: String,
    pub creator_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<plan::Model> for PlanResponse {
    fn from(p: plan::Model) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            start_date: p.start_date,
            end_date: p.end_date,
            tone: p.tone,
            status: p.status,
            approval_status: p.approval_status,
            approver_id: p.approver_id,
            approval_notes: p.approval_notes,
            team_id: p.team_id,
            creator_id: p.creator_id,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

/// Post response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub plan_id: String,
    pub title: String,
    pub content: String,
    pub scheduled_at: String,
    pub social_media_ids: Vec<String>,
    pub send_reminder: bool,
    pub status: post::PostStatus,
    pub approval_status: ApprovalState,
    pub approver_id: Option<String>,
    pub approval_notes: Option<String>,
    pub creator_id: String,
    pub created_at: String,
}

impl From<post::Model> for PostResponse {
    fn from(p: post::Model) -> Self {
        Self {
            id: p.id,
            plan_id: p.plan_id,
            title: p.title,
            content: p.content,
            scheduled_at: p.scheduled_at.to_rfc3339(),
            social_media_ids: serde_json::from_value(p.social_media_ids).unwrap_or_default(),
            send_reminder: p.send_reminder,
            status: p.status,
            approval_status: p.approval_status,
            approver_id: p.approver_id,
            approval_notes: p.approval_notes,
            creator_id: p.creator_id,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Plan with its posts in schedule order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanWithPostsResponse {
    pub plan: PlanResponse,
    pub posts: Vec<PostResponse>,
}

impl From<(plan::Model, Vec<post::Model>)> for PlanWithPostsResponse {
    fn from((plan, posts): (plan::Model, Vec<post::Model>)) -> Self {
        Self {
            plan: plan.into(),
            posts: posts.into_iter().map(Into::into).collect(),
        }
    }
}

/// Create plan request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub tone: String,
    #[serde(default = "default_status")]
    pub status: PlanStatus,
    pub team_id: String,
    #[serde(default)]
    pub pattern: WeeklyPattern,
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default)]
    pub social_media_ids: Vec<String>,
}

const fn default_status() -> PlanStatus {
    PlanStatus::Draft
}

/// Publish plan request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPlanRequest {
    pub plan_id: String,
    #[serde(default)]
    pub pattern: WeeklyPattern,
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default)]
    pub social_media_ids: Vec<String>,
}

/// Update draft plan request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanRequest {
    pub plan_id: String,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub tone: Option<String>,
}

/// Show/delete plan request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanIdRequest {
    pub plan_id: String,
}

/// List plans request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPlansRequest {
    pub team_id: String,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    10
}

// ==================== Handlers ====================

/// Create a plan, as a draft or directly published.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePlanRequest>,
) -> AppResult<ApiResponse<PlanWithPostsResponse>> {
    let input = CreatePlanInput {
        title: req.title,
        description: req.description,
        start_date: req.start_date,
        end_date: req.end_date,
        tone: req.tone,
        status: req.status,
        team_id: req.team_id,
        pattern: req.pattern,
        content: req.content,
        social_media_ids: req.social_media_ids,
    };

    let created = state.plan_service.create(&user.id, input).await?;

    Ok(ApiResponse::ok(created.into()))
}

/// Publish a draft plan.
async fn publish(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PublishPlanRequest>,
) -> AppResult<ApiResponse<PlanWithPostsResponse>> {
    let input = PublishInput {
        pattern: req.pattern,
        content: req.content,
        social_media_ids: req.social_media_ids,
    };

    let published = state
        .plan_service
        .publish_draft(&user.id, &req.plan_id, input)
        .await?;

    Ok(ApiResponse::ok(published.into()))
}

/// Update a draft plan.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdatePlanRequest>,
) -> AppResult<ApiResponse<PlanResponse>> {
    let input = UpdateDraftInput {
        title: req.title,
        description: req.description,
        start_date: req.start_date,
        end_date: req.end_date,
        tone: req.tone,
    };

    let updated = state
        .plan_service
        .update_draft(&user.id, &req.plan_id, input)
        .await?;

    Ok(ApiResponse::ok(updated.into()))
}

/// Show a plan with its posts.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PlanIdRequest>,
) -> AppResult<ApiResponse<PlanWithPostsResponse>> {
    let found = state
        .plan_service
        .get_with_posts(&user.id, &req.plan_id)
        .await?;

    Ok(ApiResponse::ok(found.into()))
}

/// List a team's plans.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListPlansRequest>,
) -> AppResult<ApiResponse<Vec<PlanResponse>>> {
    let limit = req.limit.min(100);
    let plans = state
        .plan_service
        .list_for_team(&user.id, &req.team_id, limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(plans.into_iter().map(Into::into).collect()))
}

/// Delete a plan and its posts.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PlanIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state.plan_service.delete(&user.id, &req.plan_id).await?;

    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/publish", post(publish))
        .route("/update", post(update))
        .route("/show", post(show))
        .route("/list", post(list))
        .route("/delete", post(delete))
}
