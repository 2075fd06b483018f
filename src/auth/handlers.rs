use actix_web::{web, HttpResponse};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::credentials;
use crate::auth::extract::{AuthUser, BasicGuard};
use crate::db::models::User;
use crate::db::{with_scope, TxScope, UserStore};
use crate::error::{AppError, AuthError};
use crate::response::ApiResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
}

pub async fn login(
    _guard: BasicGuard,
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("login request for username: {}", req.username);

    let username = req.username.clone();
    let user = with_scope(state.db_pool.clone(), |scope: &mut TxScope| {
        async move { UserStore::find_by_username(scope, &username).await }.boxed()
    })
    .await?;

    let user = match user {
        Some(user) if credentials::verify_password(&req.password, &user.password) => user,
        Some(_) => {
            warn!("login failed: wrong password for {}", req.username);
            return Err(AuthError::InvalidCredentials.into());
        }
        None => {
            warn!("login failed: unknown username {}", req.username);
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let tokens = issue_tokens(&state, user.id)?;
    info!("login successful for username: {}", req.username);
    Ok(HttpResponse::Ok().json(ApiResponse::success(tokens)))
}

pub async fn register(
    _guard: BasicGuard,
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("registration request for username: {}", req.username);

    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::ValidationError(
            "username and password are required".into(),
        ));
    }

    let hash = credentials::hash_password(&req.password)?;
    let user = User::new(req.username.clone(), hash);

    let created = with_scope(state.db_pool.clone(), |scope: &mut TxScope| {
        async move { UserStore::insert(scope, &user).await }.boxed()
    })
    .await?;

    let tokens = issue_tokens(&state, created.id)?;
    info!("registration successful for username: {}", req.username);
    Ok(HttpResponse::Created().json(ApiResponse::success(tokens)))
}

/// Echoes the authenticated identity extracted by the bearer gate.
pub async fn profile(user: AuthUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(user.claims)))
}

fn issue_tokens(state: &AppState, user_id: Uuid) -> Result<AuthResponse, AppError> {
    let mut data = Map::new();
    data.insert("userId".to_string(), Value::String(user_id.to_string()));

    let token = state.tokens.generate_token(data)?;
    let refresh_token = state.tokens.refresh_token(&token)?;

    Ok(AuthResponse {
        token,
        refresh_token,
    })
}
