use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use bookshelf_server::auth::handlers::{login, profile, register};
use bookshelf_server::books::handlers::{
    create_book, delete_book, get_book, list_books, update_book,
};
use bookshelf_server::{health_check, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[actix_web::main]
async fn main() -> bookshelf_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully");

    info!(
        "Starting server at {}:{}",
        config.server.host, config.server.port
    );

    // Initialize application state (pool, migrations, auth services)
    let state = AppState::new(config.clone()).await?;
    let state = web::Data::new(state);

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    let workers = config.server.workers as usize;
    let permissive_cors = config.environment == "development";
    let origin = format!("http://{}:{}", config.server.host, config.server.port);

    HttpServer::new(move || {
        let cors = if permissive_cors {
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600)
        } else {
            Cors::default()
                .allowed_origin(&origin)
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                .allowed_headers(vec!["Authorization", "Content-Type"])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/auth/v1")
                    .route("/login", web::post().to(login))
                    .route("/register", web::post().to(register))
                    .route("/profile", web::get().to(profile)),
            )
            .service(
                web::scope("/api/v1/books")
                    .route("", web::post().to(create_book))
                    .route("", web::get().to(list_books))
                    .route("/{id}", web::get().to(get_book))
                    .route("/{id}", web::put().to(update_book))
                    .route("/{id}", web::delete().to(delete_book)),
            )
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| bookshelf_server::AppError::InternalError(e.to_string()))?;

    Ok(())
}
