use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod config;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod session;

// Public and gated screen groups.
pub mod routes;
use routes::{gated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use gate::{AccessGate, GateDecision, Redirect, RoleAllowList};
pub use repository::{InMemoryStaffRepository, PostgresStaffRepository, StaffRepositoryState};
pub use session::AuthSnapshot;

/// ApiDoc
///
/// OpenAPI document for the service, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_home, handlers::get_auth_screen, handlers::get_session,
        handlers::evaluate_gate, handlers::get_dashboard, handlers::get_reports,
        handlers::get_staff_directory
    ),
    components(
        schemas(
            models::Staff, models::Location, models::EvaluateRequest, models::SessionView,
            models::Screen, gate::RoleAllowList, gate::GateDecision, gate::Redirect,
            gate::RedirectState, gate::HistoryMode,
        )
    ),
    tags(
        (name = "portal-gate", description = "Screen access gate for the staff portal")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cheaply clonable state: the staff directory and the configuration.
#[derive(Clone)]
pub struct AppState {
    /// Staff directory used to resolve token subjects to roles.
    pub repo: StaffRepositoryState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for StaffRepositoryState {
    fn from_ref(app_state: &AppState) -> StaffRepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles public and gated screens, the API docs, and the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Each gated group carries its own route_layer.
        .merge(gated::gated_routes(state.clone()))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for each request, tagged with its `x-request-id` so every log line of a
/// request (including gate decisions) correlates.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
