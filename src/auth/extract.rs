//! Request-level auth gates, modeled as actix extractors.
//!
//! Route configuration picks the gate by naming it as a handler argument:
//! [`AuthUser`] enforces bearer-token auth and carries the authenticated
//! identity, [`BasicGuard`] enforces basic auth and carries nothing.
//! Rejections are uniform 401s with a `WWW-Authenticate` challenge; the
//! internal failure reason is logged, never exposed. Neither gate touches
//! the data-store transaction.

use actix_web::http::header;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use tracing::warn;

use crate::auth::credentials::BasicVerifier;
use crate::auth::token::Claims;
use crate::error::{AppError, AuthError};
use crate::AppState;

/// Authenticated identity derived from a verified bearer token. Lives for
/// one request; never persisted.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
}

impl AuthUser {
    pub fn user_id(&self) -> Option<&str> {
        self.claims.get("userId").and_then(|v| v.as_str())
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(bearer_gate(req))
    }
}

fn bearer_gate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let state = app_state(req)?;

    let token = authorization_header(req)
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            warn!("bearer gate: missing or malformed Authorization header");
            AuthError::InvalidToken
        })?;

    let claims = state.tokens.parse_token(token)?;
    Ok(AuthUser { claims })
}

/// Marker produced by a successful basic-auth check.
#[derive(Debug, Clone, Copy)]
pub struct BasicGuard;

impl FromRequest for BasicGuard {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(basic_gate(req))
    }
}

fn basic_gate(req: &HttpRequest) -> Result<BasicGuard, AppError> {
    let state = app_state(req)?;

    let header_value = authorization_header(req).unwrap_or_default();
    let (username, password) = BasicVerifier::decode_header(header_value);

    if !state.basic.validate(&username, &password) {
        warn!("basic gate: credential validation failed");
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(BasicGuard)
}

fn app_state(req: &HttpRequest) -> Result<&AppState, AppError> {
    req.app_data::<web::Data<AppState>>()
        .map(|data| data.get_ref())
        .ok_or_else(|| AppError::InternalError("application state not configured".into()))
}

fn authorization_header(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}
