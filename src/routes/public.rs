use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. Includes both redirect targets of
/// the gate (`/auth` and `/`), which must never be gated themselves.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Home screen; landing spot for visitors lacking a screen's role.
        .route("/", get(handlers::get_home))
        // GET /auth?from=...
        // Sign-in screen; landing spot for visitors without a session.
        .route("/auth", get(handlers::get_auth_screen))
        // GET /session
        // The resolved session, for the client to render its shell.
        .route("/session", get(handlers::get_session))
        // POST /gate/evaluate
        // Gate decision for client-side navigations.
        .route("/gate/evaluate", post(handlers::evaluate_gate))
}
