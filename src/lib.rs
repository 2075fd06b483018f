pub mod auth;
pub mod books;
pub mod config;
pub mod db;
pub mod error;
pub mod response;

use std::sync::Arc;

use actix_web::HttpResponse;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use config::Settings;
pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;

pub use auth::{AuthUser, BasicGuard, BasicVerifier, TokenService};
pub use db::{with_scope, LockMode, TxScope};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all workers. Everything here is immutable
/// after startup; per-request state lives in [`TxScope`] and the extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db_pool: Arc<PgPool>,
    pub tokens: Arc<TokenService>,
    pub basic: Arc<BasicVerifier>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await
            .map_err(|e| {
                AppError::DatabaseError(error::DatabaseError::ConnectionError(e.to_string()))
            })?;

        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .map_err(|e| AppError::DatabaseError(error::DatabaseError::QueryError(e.to_string())))?;

        let tokens = TokenService::from_config(&config.auth)?;
        let basic = BasicVerifier::new(
            config.auth.basic_username.clone(),
            config.auth.basic_password.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            db_pool: Arc::new(db_pool),
            tokens: Arc::new(tokens),
            basic: Arc::new(basic),
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.db_pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_clone_shares_arcs() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .expect("valid database url");

        let state = AppState {
            config: Arc::new(config),
            db_pool: Arc::new(pool),
            tokens: Arc::new(test_token_service()),
            basic: Arc::new(BasicVerifier::new("admin".into(), "secret".into())),
        };

        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.db_pool, &cloned.db_pool));
        assert!(Arc::ptr_eq(&state.tokens, &cloned.tokens));
    }

    fn test_token_service() -> TokenService {
        // Verify-only service; signing is not needed here.
        TokenService::new(
            None,
            include_str!("../tests/fixtures/test_rsa_public.pem"),
            "issuer",
            "audience",
            5,
            30,
        )
        .expect("valid test key")
    }
}
