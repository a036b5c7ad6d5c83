use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    models::{SessionView, Staff},
    repository::StaffRepositoryState,
};

/// Cookie carrying the session token for browser navigations.
pub const TOKEN_COOKIE: &str = "portal_token";
/// Local-only header naming a staff id to sign in as.
pub const STAFF_ID_HEADER: &str = "x-staff-id";

/// Claims
///
/// Payload of a session token. Issued by the external sign-in flow; this service
/// only validates it.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: id of the staff record in the directory.
    pub sub: Uuid,
    /// Expiration time (seconds since epoch). Always validated.
    pub exp: usize,
    /// Issued at (seconds since epoch).
    pub iat: usize,
}

/// Reasons a request resolves to an empty session. Logged, never surfaced.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no session token presented")]
    MissingToken,
    #[error("session token rejected: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("staff {0} not found in directory")]
    UnknownStaff(Uuid),
}

/// AuthSnapshot
///
/// Read-only view of the visitor's session for one request. Either field may be
/// absent; the gate treats absence of either as "not signed in".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub token: Option<String>,
    pub staff: Option<Staff>,
}

impl AuthSnapshot {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(token: impl Into<String>, staff: Staff) -> Self {
        Self {
            token: Some(token.into()),
            staff: Some(staff),
        }
    }

    pub fn role(&self) -> Option<&str> {
        self.staff.as_ref().map(|staff| staff.role.as_str())
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            has_token: self.token.is_some(),
            authenticated: self.token.is_some() && self.staff.is_some(),
            staff: self.staff.clone(),
        }
    }
}

/// Bearer token from the Authorization header, else the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Validates the token signature and expiry and returns its subject.
pub fn verify_token(token: &str, secret: &str) -> Result<Uuid, SessionError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
    Ok(token_data.claims.sub)
}

/// AuthSnapshot Extractor
///
/// Resolves the session for a request and never rejects:
/// 1. Local bypass: in Env::Local, `x-staff-id` naming a known staff id signs in as them.
/// 2. Token: Bearer header or `portal_token` cookie, HS256 with `exp` validated.
/// 3. Directory lookup of the token subject. A valid token for an unknown staff
///    id keeps the token but carries no staff.
///
/// A snapshot already stored in the request extensions (by `require_access`) is
/// reused as is.
impl<S> FromRequestParts<S> for AuthSnapshot
where
    S: Send + Sync,
    StaffRepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already resolved by the gate middleware for this request.
        if let Some(snapshot) = parts.extensions.get::<AuthSnapshot>() {
            return Ok(snapshot.clone());
        }

        let repo = StaffRepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get(STAFF_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok());

            if let Some(staff_id) = bypass_id {
                if let Some(staff) = repo.get_staff(staff_id).await {
                    return Ok(AuthSnapshot::signed_in(format!("local:{staff_id}"), staff));
                }
            }
        }

        let token = match token_from_headers(&parts.headers).ok_or(SessionError::MissingToken) {
            Ok(token) => token,
            Err(e) => {
                tracing::trace!(error = %e, "anonymous request");
                return Ok(AuthSnapshot::anonymous());
            }
        };

        let staff_id = match verify_token(&token, &config.jwt_secret) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(error = %e, "discarding session");
                return Ok(AuthSnapshot::anonymous());
            }
        };

        let staff = repo.get_staff(staff_id).await;
        if staff.is_none() {
            tracing::debug!(error = %SessionError::UnknownStaff(staff_id), "token without staff");
        }

        Ok(AuthSnapshot {
            token: Some(token),
            staff,
        })
    }
}
