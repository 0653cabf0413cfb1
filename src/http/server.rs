//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all grant handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Bind server to listener and shut down gracefully

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::CoordinatorConfig;
use crate::grants::GrantReconciler;
use crate::http::handlers;
use crate::http::request::request_id_middleware;
use crate::lifecycle::signals::shutdown_signal;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub reconciler: GrantReconciler,
}

/// HTTP server for the grant coordinator.
pub struct HttpServer {
    router: Router,
    config: CoordinatorConfig,
}

impl HttpServer {
    pub fn new(config: CoordinatorConfig, reconciler: GrantReconciler) -> Self {
        let router = build_router(&config, AppState { reconciler });
        Self { router, config }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            contract_id = %self.config.soroban.contract_id,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &CoordinatorConfig, state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/grants/build/create", post(handlers::create_grant))
        .route(
            "/grants/build/register-milestone",
            post(handlers::build_register_milestone),
        )
        .route(
            "/grants/build/approve-milestone",
            post(handlers::build_approve_milestone),
        )
        .route("/grants/build/claim-payment", post(handlers::build_claim_payment))
        .route("/grants/{id}", get(handlers::get_grant))
        .route(
            "/grants/{id}/milestones/{milestone_id}",
            get(handlers::get_milestone),
        )
        .route("/grants/{id}/confirm", post(handlers::confirm_grant))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.security.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}
