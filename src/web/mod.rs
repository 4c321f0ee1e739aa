pub mod auth;
pub mod dashboard;
pub mod employees;
pub mod locations;
pub mod messages;
pub mod profile;
pub mod reports;
pub mod session;
pub mod stats;
pub mod tasks;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::router(state.clone()))
        .nest("/dashboard", dashboard::router(state.clone()))
        .nest("/employees", employees::router(state.clone()))
        .nest("/tasks", tasks::router(state.clone()))
        .nest("/reports", reports::router(state.clone()))
        .nest("/messages", messages::router(state.clone()))
        .nest("/profile", profile::router(state.clone()))
        .nest("/locations", locations::router(state.clone()))
        .nest("/stats", stats::router(state))
}
