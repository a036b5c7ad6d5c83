use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use portal_gate::{
    AppState, GateDecision,
    config::AppConfig,
    create_router,
    models::{Screen, SessionView},
    repository::InMemoryStaffRepository,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

// --- Helper Functions ---

// Seeded by InMemoryStaffRepository::with_demo_staff.
const ADMIN_ID: Uuid = Uuid::from_u128(1);
const STAFF_ID: Uuid = Uuid::from_u128(2);
const VIEWER_ID: Uuid = Uuid::from_u128(3);

fn app() -> Router {
    create_router(AppState {
        repo: Arc::new(InMemoryStaffRepository::with_demo_staff()),
        config: AppConfig::default(),
    })
}

async fn get(uri: &str, staff_id: Option<Uuid>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(id) = staff_id {
        builder = builder.header("x-staff-id", id.to_string());
    }
    app()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn evaluate(body: serde_json::Value, staff_id: Option<Uuid>) -> GateDecision {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/gate/evaluate")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(id) = staff_id {
        builder = builder.header("x-staff-id", id.to_string());
    }
    let response = app()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json(response).await
}

async fn json<T: DeserializeOwned>(response: Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location_header(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
}

// --- Public Screens ---

#[tokio::test]
async fn test_health_check() {
    let response = get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_screen_echoes_return_path() {
    let response = get("/auth?from=%2Freports%3Fyear%3D2025", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let screen: Screen = json(response).await;
    assert_eq!(screen.name, "auth");
    assert_eq!(screen.return_to.as_deref(), Some("/reports?year=2025"));
}

#[tokio::test]
async fn test_session_for_anonymous_visitor() {
    let view: SessionView = json(get("/session", None).await).await;
    assert!(!view.authenticated);
    assert!(!view.has_token);
    assert!(view.staff.is_none());
}

#[tokio::test]
async fn test_session_for_signed_in_staff() {
    let view: SessionView = json(get("/session", Some(VIEWER_ID)).await).await;
    assert!(view.authenticated);
    assert_eq!(view.staff.map(|s| s.role), Some("VIEWER".to_string()));
}

// --- Gated Screens ---

#[tokio::test]
async fn test_anonymous_visitor_is_sent_to_auth_with_from() {
    let response = get("/reports?year=2025", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location_header(&response),
        "/auth?from=%2Freports%3Fyear%3D2025"
    );
}

#[tokio::test]
async fn test_dashboard_admits_any_staff() {
    let response = get("/dashboard", Some(STAFF_ID)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let screen: Screen = json(response).await;
    assert_eq!(screen.name, "dashboard");
    assert_eq!(screen.viewer_role.as_deref(), Some("STAFF"));
}

#[tokio::test]
async fn test_reports_admits_listed_role() {
    let response = get("/reports", Some(VIEWER_ID)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_staff_screen_sends_non_elevated_home() {
    let response = get("/staff", Some(VIEWER_ID)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_header(&response), "/");
}

#[tokio::test]
async fn test_admin_passes_every_gate() {
    for uri in ["/dashboard", "/reports", "/staff"] {
        let response = get(uri, Some(ADMIN_ID)).await;
        assert_eq!(response.status(), StatusCode::OK, "admin blocked from {uri}");
    }
}

#[tokio::test]
async fn test_unknown_bypass_id_is_anonymous() {
    let response = get("/dashboard", Some(Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_header(&response), "/auth?from=%2Fdashboard");
}

// --- Client-side Evaluation ---

#[tokio::test]
async fn test_evaluate_anonymous_redirects_to_auth() {
    let decision = evaluate(
        serde_json::json!({ "location": { "pathname": "/reports", "hash": "#q" } }),
        None,
    )
    .await;

    match decision {
        GateDecision::Redirect(redirect) => {
            assert_eq!(redirect.target, "/auth");
            let from = redirect.state.unwrap().from;
            assert_eq!(from.pathname, "/reports");
            assert_eq!(from.hash, "#q");
        }
        other => panic!("expected redirect, got {other:?}"),
    }
}

#[tokio::test]
async fn test_evaluate_admin_ignores_allow_list() {
    let decision = evaluate(
        serde_json::json!({ "allowed_roles": ["VIEWER"], "location": { "pathname": "/x" } }),
        Some(ADMIN_ID),
    )
    .await;
    assert_eq!(decision, GateDecision::RenderChildren);
}

#[tokio::test]
async fn test_evaluate_role_outside_allow_list_goes_home() {
    let decision = evaluate(
        serde_json::json!({ "allowed_roles": ["VIEWER"], "location": { "pathname": "/x" } }),
        Some(STAFF_ID),
    )
    .await;

    match decision {
        GateDecision::Redirect(redirect) => {
            assert_eq!(redirect.target, "/");
            assert!(redirect.state.is_none());
        }
        other => panic!("expected redirect, got {other:?}"),
    }
}

#[tokio::test]
async fn test_evaluate_without_allow_list_renders() {
    let decision = evaluate(
        serde_json::json!({ "location": { "pathname": "/x" } }),
        Some(STAFF_ID),
    )
    .await;
    assert_eq!(decision, GateDecision::RenderChildren);
}

#[tokio::test]
async fn test_evaluate_listed_role_renders() {
    let decision = evaluate(
        serde_json::json!({ "allowed_roles": ["VIEWER", "STAFF"], "location": { "pathname": "/x" } }),
        Some(VIEWER_ID),
    )
    .await;
    assert_eq!(decision, GateDecision::RenderChildren);
}
