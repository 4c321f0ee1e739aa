use axum::{routing::get_service, Router};
use base64::{engine::general_purpose, Engine as _};
use fieldtrack::db::{self, seed};
use fieldtrack::middleware::RateLimiter;
use fieldtrack::state::{AppState, SharedState};
use fieldtrack::web;
use rand::RngCore;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{services::ServeDir, services::ServeFile, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://employees.db".to_string());
    tracing::info!("Opening database {database_url}");
    let pool = db::connect(&database_url).await.map_err(|e| {
        tracing::error!("Failed to open database: {e}");
        e
    })?;

    db::MIGRATOR.run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run database migrations: {e}");
        e
    })?;
    tracing::info!("Database migrations completed");

    seed::seed_all(&pool).await?;

    let session_key = match std::env::var("SESSION_KEY") {
        Ok(b64) => general_purpose::STANDARD
            .decode(b64)
            .expect("SESSION_KEY must be base64"),
        Err(_) => {
            tracing::warn!("SESSION_KEY not set, using an ephemeral key; sessions reset on restart");
            let mut key = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut key);
            key.to_vec()
        }
    };

    let shared: SharedState = Arc::new(AppState {
        pool,
        session_key,
        login_limiter: RateLimiter::new(5, 60),
    });

    let static_handler =
        ServeDir::new("static").not_found_service(ServeFile::new("static/index.html"));

    let app = Router::new()
        .merge(web::routes(shared.clone()))
        .fallback_service(get_service(static_handler))
        .layer(TraceLayer::new_for_http());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| {
        let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        format!("0.0.0.0:{port}")
    });
    tracing::info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
