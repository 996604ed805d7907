//! Contentplan server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use contentplan_api::{middleware::AppState, router as api_router};
use contentplan_common::Config;
use contentplan_core::{
    ApprovalService, NotificationDispatcher, PlanService, PushDeliveryService,
};
use contentplan_db::repositories::{
    NotificationRepository, PlanRepository, PostRepository, TeamMemberRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contentplan=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting contentplan server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = contentplan_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    contentplan_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let plan_repo = PlanRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let team_member_repo = TeamMemberRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    // Initialize services
    let mut notification_dispatcher = NotificationDispatcher::new(notification_repo);
    if let Some(push) = PushDeliveryService::from_config(&config.push)? {
        info!("Push delivery mirror enabled");
        notification_dispatcher.set_push_delivery(push);
    } else {
        info!("No push endpoint configured, notifications stay in-app only");
    }

    let plan_service = PlanService::new(
        plan_repo.clone(),
        post_repo.clone(),
        team_member_repo.clone(),
        notification_dispatcher.clone(),
    );
    let approval_service = ApprovalService::new(
        plan_repo,
        post_repo,
        team_member_repo,
        notification_dispatcher.clone(),
    );

    // Create app state
    let state = AppState {
        plan_service,
        approval_service,
        notification_dispatcher,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn(
            contentplan_api::middleware::identity_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
