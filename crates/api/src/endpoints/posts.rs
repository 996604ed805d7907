//! Post endpoints.

use axum::{Json, Router, extract::State, routing::post};
use contentplan_common::AppResult;
use contentplan_core::services::plan::PostOutcome;
use serde::Deserialize;

use crate::endpoints::plans::PostResponse;
use crate::{middleware::AppState, response::ApiResponse};

/// Outcome report from the publishing collaborator.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutcomeRequest {
    pub post_id: String,
    pub outcome: PostOutcome,
}

/// Record the terminal outcome of a scheduled post.
///
/// Called by the publishing service, not by end users, so there is no
/// user context on this route.
async fn report_outcome(
    State(state): State<AppState>,
    Json(req): Json<ReportOutcomeRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let updated = state
        .plan_service
        .report_post_outcome(&req.post_id, req.outcome)
        .await?;

    tracing::info!(post_id = %updated.id, status = ?updated.status, "Recorded post outcome");

    Ok(ApiResponse::ok(updated.into()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/report-outcome", post(report_outcome))
}
