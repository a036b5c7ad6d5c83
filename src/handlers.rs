use axum::{Json, extract::Query};

use crate::{
    gate::{AccessGate, GateDecision},
    models::{AuthQuery, EvaluateRequest, Screen, SessionView},
    session::AuthSnapshot,
};

fn screen(name: &str, title: &str, snapshot: &AuthSnapshot) -> Screen {
    Screen {
        name: name.to_string(),
        title: title.to_string(),
        viewer_role: snapshot.role().map(str::to_string),
        return_to: None,
    }
}

// --- Public Screens ---

/// get_home
///
/// [Public Route] Home screen. Also where the gate sends signed-in staff who
/// lack the role a screen requires.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Home screen", body = Screen))
)]
pub async fn get_home(snapshot: AuthSnapshot) -> Json<Screen> {
    Json(screen("home", "Home", &snapshot))
}

/// get_auth_screen
///
/// [Public Route] Sign-in screen. Echoes the `from` return path placed on the
/// URL by the gate's redirect so the sign-in flow can send the visitor back.
#[utoipa::path(
    get,
    path = "/auth",
    params(AuthQuery),
    responses((status = 200, description = "Sign-in screen", body = Screen))
)]
pub async fn get_auth_screen(Query(query): Query<AuthQuery>) -> Json<Screen> {
    Json(Screen {
        name: "auth".to_string(),
        title: "Sign in".to_string(),
        viewer_role: None,
        return_to: query.from,
    })
}

/// get_session
///
/// [Public Route] Reports the visitor's resolved session. Anonymous visitors
/// get `authenticated: false` rather than a 401.
#[utoipa::path(
    get,
    path = "/session",
    responses((status = 200, description = "Current session", body = SessionView))
)]
pub async fn get_session(snapshot: AuthSnapshot) -> Json<SessionView> {
    Json(snapshot.view())
}

/// evaluate_gate
///
/// [Public Route] Runs the access gate for a client-side router. The router
/// posts the location it is about to render and the screen's allow-list, and
/// dispatches on the returned decision.
#[utoipa::path(
    post,
    path = "/gate/evaluate",
    request_body = EvaluateRequest,
    responses((status = 200, description = "Gate decision", body = GateDecision))
)]
pub async fn evaluate_gate(
    snapshot: AuthSnapshot,
    Json(payload): Json<EvaluateRequest>,
) -> Json<GateDecision> {
    let gate = AccessGate::with_allowed_roles(payload.allowed_roles);
    let decision = gate.decide(&snapshot, &payload.location);

    tracing::debug!(
        path = %payload.location.pathname,
        role = snapshot.role().unwrap_or("-"),
        decision = ?decision,
        "gate evaluated"
    );

    Json(decision)
}

// --- Gated Screens ---

/// get_dashboard
///
/// [Gated Route] Any signed-in staff.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard screen", body = Screen),
        (status = 303, description = "Redirect to /auth")
    )
)]
pub async fn get_dashboard(snapshot: AuthSnapshot) -> Json<Screen> {
    Json(screen("dashboard", "Dashboard", &snapshot))
}

/// get_reports
///
/// [Gated Route] VIEWER and STAFF, plus elevated roles.
#[utoipa::path(
    get,
    path = "/reports",
    responses(
        (status = 200, description = "Reports screen", body = Screen),
        (status = 303, description = "Redirect to /auth or /")
    )
)]
pub async fn get_reports(snapshot: AuthSnapshot) -> Json<Screen> {
    Json(screen("reports", "Reports", &snapshot))
}

/// get_staff_directory
///
/// [Gated Route] Elevated roles only (empty allow-list).
#[utoipa::path(
    get,
    path = "/staff",
    responses(
        (status = 200, description = "Staff management screen", body = Screen),
        (status = 303, description = "Redirect to /auth or /")
    )
)]
pub async fn get_staff_directory(snapshot: AuthSnapshot) -> Json<Screen> {
    Json(screen("staff", "Staff", &snapshot))
}
