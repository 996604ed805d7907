//! Approval workflow endpoints.

use axum::{Json, Router, extract::State, routing::post};
use contentplan_common::AppResult;
use contentplan_core::services::approval::{ApprovableItem, ApprovalSummary, ItemRef};
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Kind of item under review.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Plan,
    Post,
}

impl ItemKind {
    fn to_ref(self, id: String) -> ItemRef {
        match self {
            Self::Plan => ItemRef::Plan(id),
            Self::Post => ItemRef::Post(id),
        }
    }
}

/// Assign approver request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignApproverRequest {
    pub item_type: ItemKind,
    pub item_id: String,
    pub approver_id: String,
}

/// Approve request. Notes are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub item_type: ItemKind,
    pub item_id: String,
    pub notes: Option<String>,
}

/// Reject request. Notes are mandatory.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub item_type: ItemKind,
    pub item_id: String,
    #[serde(default)]
    pub notes: String,
}

/// List pending reviews request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPendingRequest {
    pub team_id: String,
    pub approver_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    10
}

/// Assign an approver, opening a review cycle.
async fn assign(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<AssignApproverRequest>,
) -> AppResult<ApiResponse<ApprovableItem>> {
    let item = req.item_type.to_ref(req.item_id);
    let updated = state
        .approval_service
        .assign_approver(&user.id, &item, &req.approver_id)
        .await?;

    Ok(ApiResponse::ok(updated))
}

/// Approve a pending item.
async fn approve(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ApproveRequest>,
) -> AppResult<ApiResponse<ApprovableItem>> {
    let item = req.item_type.to_ref(req.item_id);
    let updated = state
        .approval_service
        .approve(&user.id, &item, req.notes.as_deref())
        .await?;

    Ok(ApiResponse::ok(updated))
}

/// Reject a pending item with notes.
async fn reject(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RejectRequest>,
) -> AppResult<ApiResponse<ApprovableItem>> {
    let item = req.item_type.to_ref(req.item_id);
    let updated = state
        .approval_service
        .reject(&user.id, &item, &req.notes)
        .await?;

    Ok(ApiResponse::ok(updated))
}

/// List the pending review queue of a team.
async fn list_pending(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListPendingRequest>,
) -> AppResult<ApiResponse<Vec<ApprovalSummary>>> {
    let limit = req.limit.min(100);
    let queue = state
        .approval_service
        .list_pending(
            &user.id,
            &req.team_id,
            req.approver_id.as_deref(),
            limit,
            req.offset,
        )
        .await?;

    Ok(ApiResponse::ok(queue))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/assign", post(assign))
        .route("/approve", post(approve))
        .route("/reject", post(reject))
        .route("/list-pending", post(list_pending))
}
