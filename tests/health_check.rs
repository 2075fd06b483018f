use actix_web::{test, web, App};
use bookshelf_server::{AppState, BasicVerifier, Settings, TokenService};
use chrono::DateTime;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

fn test_state() -> AppState {
    let config = Settings::new_for_test().expect("Failed to load test config");
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("Failed to create lazy pool");
    let tokens = TokenService::new(
        Some(include_str!("fixtures/test_rsa_private.pem")),
        include_str!("fixtures/test_rsa_public.pem"),
        &config.auth.issuer,
        &config.auth.audience,
        config.auth.token_ttl_minutes,
        config.auth.refresh_ttl_minutes,
    )
    .expect("Failed to build token service");
    let basic = BasicVerifier::new(
        config.auth.basic_username.clone(),
        config.auth.basic_password.clone(),
    );

    AppState {
        config: Arc::new(config),
        db_pool: Arc::new(pool),
        tokens: Arc::new(tokens),
        basic: Arc::new(basic),
    }
}

#[actix_web::test]
async fn test_health_check() {
    let state = web::Data::new(test_state());

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .route("/health", web::get().to(bookshelf_server::health_check)),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());

    let body = test::read_body(resp).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "healthy");
    assert!(DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
}
