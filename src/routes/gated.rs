use crate::{
    AppState,
    gate::{AccessGate, GateState, require_access},
    handlers,
};
use axum::{Router, middleware, routing::get};

/// Gated Router Module
///
/// Every screen here runs behind `require_access`. Visitors without a session
/// are sent to `/auth?from=<path>`; signed-in staff outside a screen's
/// allow-list are sent to `/`. ADMIN and SUPER_ADMIN pass every gate.
pub fn gated_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // GET /dashboard
        // Any signed-in staff.
        .merge(guarded(
            &state,
            AccessGate::authenticated(),
            Router::new().route("/dashboard", get(handlers::get_dashboard)),
        ))
        // GET /reports
        // Reporting roles.
        .merge(guarded(
            &state,
            AccessGate::allow(["VIEWER", "STAFF"]),
            Router::new().route("/reports", get(handlers::get_reports)),
        ))
        // GET /staff
        // Staff management; the empty allow-list leaves only elevated roles.
        .merge(guarded(
            &state,
            AccessGate::elevated_only(),
            Router::new().route("/staff", get(handlers::get_staff_directory)),
        ))
}

/// Wraps `routes` with `gate`.
fn guarded(state: &AppState, gate: AccessGate, routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state(
        GateState::new(state.clone(), gate),
        require_access,
    ))
}
