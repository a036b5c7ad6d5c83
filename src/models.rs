use axum::http::Uri;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::gate::RoleAllowList;

// --- Identity ---

/// Staff
///
/// A staff identity as held in the `staff` table. The gate only consults `role`;
/// the other fields ride along for screens and the session view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Staff {
    pub id: Uuid,
    pub email: String,
    // Compared verbatim, e.g. "ADMIN", "STAFF", "VIEWER".
    pub role: String,
}

// --- Navigation ---

/// Location
///
/// The current navigation target as a router sees it. Carried forward on the
/// `/auth` redirect so the sign-in flow can send the visitor back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Location {
    pub pathname: String,
    /// Query string including the leading `?`, or empty.
    #[serde(default)]
    pub search: String,
    /// Fragment including the leading `#`, or empty. Never sent to the server
    /// by browsers, so only populated by client-side routers.
    #[serde(default)]
    pub hash: String,
}

impl Location {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            ..Self::default()
        }
    }

    /// Full path as it would appear in the address bar.
    pub fn href(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }
}

impl From<&Uri> for Location {
    fn from(uri: &Uri) -> Self {
        Self {
            pathname: uri.path().to_string(),
            search: uri.query().map(|q| format!("?{q}")).unwrap_or_default(),
            hash: String::new(),
        }
    }
}

// --- Request Payloads ---

/// EvaluateRequest
///
/// Input for `POST /gate/evaluate`: a client-side router asks whether the
/// current session may render the screen at `location`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct EvaluateRequest {
    /// Omitted means any signed-in staff may pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub allowed_roles: Option<RoleAllowList>,
    pub location: Location,
}

/// AuthQuery
///
/// Query accepted by the sign-in screen. `from` is the return path set by the
/// gate's redirect.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct AuthQuery {
    pub from: Option<String>,
}

// --- Output Schemas ---

/// SessionView
///
/// Output of `GET /session`. Exposes whether a token is present without ever
/// echoing the token itself.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionView {
    pub has_token: bool,
    pub authenticated: bool,
    pub staff: Option<Staff>,
}

/// Screen
///
/// Payload rendered for a screen of the routed application.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Screen {
    pub name: String,
    pub title: String,
    /// Role of the viewer, if signed in.
    pub viewer_role: Option<String>,
    /// Where the sign-in screen should return to (auth screen only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_to: Option<String>,
}
