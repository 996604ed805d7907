//! HTTP API layer for contentplan.
//!
//! This crate provides the REST API surface:
//!
//! - **Endpoints**: plan lifecycle, approval workflow, notifications
//! - **Extractors**: authenticated user context
//! - **Middleware**: gateway identity resolution
//! - **Response**: the shared JSON envelope
//!
//! Built on Axum 0.8 with a Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
