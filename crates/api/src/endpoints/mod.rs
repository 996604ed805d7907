//! API endpoints.

mod approvals;
mod notifications;
mod plans;
mod posts;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/plans", plans::router())
        .nest("/posts", posts::router())
        .nest("/approvals", approvals::router())
        .nest("/notifications", notifications::router())
}
