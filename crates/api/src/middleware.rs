//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use contentplan_core::{ApprovalService, NotificationDispatcher, PlanService};

/// Header carrying the caller identity, set by the upstream auth gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub plan_service: PlanService,
    pub approval_service: ApprovalService,
    pub notification_dispatcher: NotificationDispatcher,
}

/// Request-scoped caller identity.
///
/// Authentication itself happens at the gateway; this service trusts
/// the forwarded header.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub id: String,
}

/// Identity middleware.
///
/// Resolves the gateway header into a [`UserContext`] request
/// extension; routes behind the `AuthUser` extractor reject requests
/// where the header is missing or malformed.
pub async fn identity_middleware(mut req: Request<Body>, next: Next) -> Response {
    if let Some(header) = req.headers().get(USER_ID_HEADER)
        && let Ok(user_id) = header.to_str()
        && !user_id.trim().is_empty()
    {
        let context = UserContext {
            id: user_id.to_string(),
        };
        req.extensions_mut().insert(context);
    }

    next.run(req).await
}
