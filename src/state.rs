use crate::middleware::RateLimiter;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub session_key: Vec<u8>,
    pub login_limiter: RateLimiter,
}

pub type SharedState = Arc<AppState>;
