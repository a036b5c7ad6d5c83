use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    AppState,
    config::AppConfig,
    models::Location,
    repository::StaffRepositoryState,
    session::AuthSnapshot,
};

/// Sign-in screen. Unauthenticated visitors land here.
pub const AUTH_PATH: &str = "/auth";
/// Home screen. Authenticated visitors without the required role land here.
pub const HOME_PATH: &str = "/";

/// Roles exempt from every allow-list.
pub const ELEVATED_ROLES: [&str; 2] = ["ADMIN", "SUPER_ADMIN"];

pub fn is_elevated(role: &str) -> bool {
    ELEVATED_ROLES.contains(&role)
}

/// RoleAllowList
///
/// Roles permitted through a gate. Kept in call-site order but only ever used
/// for membership; comparison is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(transparent)]
#[ts(export)]
pub struct RoleAllowList(Vec<String>);

impl RoleAllowList {
    pub fn new<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }

    pub fn permits(&self, role: &str) -> bool {
        self.0.iter().any(|allowed| allowed == role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<R: Into<String>> FromIterator<R> for RoleAllowList {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// HistoryMode
///
/// How a redirect interacts with navigation history. The gate only ever
/// replaces the current entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum HistoryMode {
    Replace,
}

/// RedirectState
///
/// Context handed to the redirect target. `from` lets the sign-in flow return
/// the visitor to where they were headed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RedirectState {
    pub from: Location,
}

/// Redirect
///
/// A navigation instruction issued in place of the protected content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Redirect {
    pub target: String,
    pub history: HistoryMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub state: Option<RedirectState>,
}

impl Redirect {
    /// Redirect to the sign-in screen, remembering `from`.
    pub fn to_auth(from: &Location) -> Self {
        Self {
            target: AUTH_PATH.to_string(),
            history: HistoryMode::Replace,
            state: Some(RedirectState { from: from.clone() }),
        }
    }

    /// Redirect to the home screen.
    pub fn to_home() -> Self {
        Self {
            target: HOME_PATH.to_string(),
            history: HistoryMode::Replace,
            state: None,
        }
    }

    /// The URI a browser should be sent to. Carried state travels as a `from`
    /// query parameter holding the original href.
    pub fn uri(&self) -> String {
        match &self.state {
            Some(RedirectState { from }) => {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("from", &from.href())
                    .finish();
                format!("{}?{}", self.target, query)
            }
            None => self.target.clone(),
        }
    }
}

/// Server-side rendition of a history-replacing navigation: 303 See Other, so
/// the browser follows with a GET and the gated URL never becomes an entry.
impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        axum::response::Redirect::to(&self.uri()).into_response()
    }
}

/// GateDecision
///
/// Outcome of one gate evaluation. Never cached; recomputed per navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "decision", rename_all = "snake_case")]
#[ts(export)]
pub enum GateDecision {
    Redirect(Redirect),
    RenderChildren,
}

/// AccessGate
///
/// Guards a screen with an optional role allow-list.
///
/// Evaluation, first match wins:
/// 1. No token or no staff identity: redirect to `/auth` carrying the location.
/// 2. Elevated role (`ADMIN`, `SUPER_ADMIN`): render, whatever the allow-list says.
/// 3. Allow-list present and missing the role: redirect to `/`.
/// 4. Otherwise: render.
///
/// An absent allow-list admits any signed-in staff; an empty one admits only
/// elevated roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessGate {
    allowed_roles: Option<RoleAllowList>,
}

impl AccessGate {
    /// Gate that admits any signed-in staff.
    pub fn authenticated() -> Self {
        Self {
            allowed_roles: None,
        }
    }

    pub fn allow<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            allowed_roles: Some(RoleAllowList::new(roles)),
        }
    }

    /// Gate that admits only elevated roles.
    pub fn elevated_only() -> Self {
        Self {
            allowed_roles: Some(RoleAllowList::default()),
        }
    }

    pub fn with_allowed_roles(allowed_roles: Option<RoleAllowList>) -> Self {
        Self { allowed_roles }
    }

    pub fn allowed_roles(&self) -> Option<&RoleAllowList> {
        self.allowed_roles.as_ref()
    }

    /// Pure decision over an already resolved session and location.
    pub fn decide(&self, snapshot: &AuthSnapshot, location: &Location) -> GateDecision {
        let staff = match (&snapshot.token, &snapshot.staff) {
            (Some(_), Some(staff)) => staff,
            _ => return GateDecision::Redirect(Redirect::to_auth(location)),
        };

        if is_elevated(&staff.role) {
            return GateDecision::RenderChildren;
        }

        match &self.allowed_roles {
            Some(allowed) if !allowed.permits(&staff.role) => {
                GateDecision::Redirect(Redirect::to_home())
            }
            _ => GateDecision::RenderChildren,
        }
    }

    /// Hands back `children` when the gate passes, the redirect otherwise.
    pub fn evaluate<C>(
        &self,
        children: C,
        snapshot: &AuthSnapshot,
        location: &Location,
    ) -> Result<C, Redirect> {
        match self.decide(snapshot, location) {
            GateDecision::RenderChildren => Ok(children),
            GateDecision::Redirect(redirect) => Err(redirect),
        }
    }
}

/// Router facility: the current location is read straight off the request URI.
impl<S> FromRequestParts<S> for Location
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Location::from(&parts.uri))
    }
}

/// GateState
///
/// State handed to `require_access`: the shared application state plus the
/// gate configured for one group of screens.
#[derive(Clone)]
pub struct GateState {
    pub app: AppState,
    pub gate: AccessGate,
}

impl GateState {
    pub fn new(app: AppState, gate: AccessGate) -> Self {
        Self { app, gate }
    }
}

impl FromRef<GateState> for StaffRepositoryState {
    fn from_ref(state: &GateState) -> StaffRepositoryState {
        state.app.repo.clone()
    }
}

impl FromRef<GateState> for AppConfig {
    fn from_ref(state: &GateState) -> AppConfig {
        state.app.config.clone()
    }
}

/// require_access
///
/// Route-layer middleware wrapping gated screens. The inner handler is the
/// "children": it only runs when the gate renders.
pub async fn require_access(
    State(GateState { gate, .. }): State<GateState>,
    snapshot: AuthSnapshot,
    location: Location,
    mut request: Request,
    next: Next,
) -> Response {
    match gate.evaluate(next, &snapshot, &location) {
        Ok(next) => {
            tracing::debug!(
                path = %location.pathname,
                role = snapshot.role().unwrap_or("-"),
                "gate passed"
            );
            request.extensions_mut().insert(snapshot);
            next.run(request).await
        }
        Err(redirect) => {
            tracing::debug!(
                path = %location.pathname,
                role = snapshot.role().unwrap_or("-"),
                target = %redirect.target,
                "gate redirected"
            );
            redirect.into_response()
        }
    }
}
