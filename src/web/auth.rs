use crate::db;
use crate::domain::models::UserRole;
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::{self, SessionClaims};
use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
    pub email: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
    pub display_name: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/register", post(register))
        .with_state(state)
}

fn session_cookie(value: &str, max_age: Option<i64>) -> HeaderMap {
    let mut cookie = format!("session={value}; HttpOnly; SameSite=Lax; Path=/");
    if let Some(age) = max_age {
        cookie.push_str(&format!("; Max-Age={age}"));
    }
    let mut headers = HeaderMap::new();
    if let Ok(parsed) = cookie.parse() {
        headers.insert(axum::http::header::SET_COOKIE, parsed);
    }
    headers
}

async fn login(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Brute-force guard: 5 attempts per 60 seconds per IP.
    let ip = addr.ip().to_string();
    if !state.login_limiter.check(&ip).await {
        tracing::warn!("Login rate limit exceeded for IP: {ip}");
        return Err(AppError::RateLimited);
    }

    let user = db::authenticate(&state.pool, &payload.username, &payload.password)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let display_name = user
        .display_name
        .unwrap_or_else(|| "Administrator".to_string());

    let claims = SessionClaims::new(user.id, user.username.clone(), user.role, display_name);
    let token = session::sign_session(&claims, &state.session_key)
        .map_err(|e| AppError::Internal(format!("failed to sign session: {e}")))?;

    tracing::info!("User {} logged in", user.username);

    let resp = LoginResponse {
        user_id: user.id,
        username: user.username,
        role: user.role,
        display_name: claims.display_name,
    };
    Ok((session_cookie(&token, None), Json(resp)))
}

async fn logout() -> impl IntoResponse {
    (
        session_cookie("", Some(0)),
        Json(json!({ "message": "logged out" })),
    )
}

/// Self-service registration. Always creates an employee-role user with no
/// linked employee record; admins attach one later.
async fn register(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation("username and password are required".into()));
    }
    if let Some(confirm) = &payload.confirm_password {
        if confirm != &payload.password {
            return Err(AppError::Validation("passwords do not match".into()));
        }
    }

    let hash = db::hash_password(&payload.password)?;
    let user_id = db::register_user(
        &state.pool,
        payload.username.trim(),
        &hash,
        &payload.email,
        UserRole::Employee,
        None,
    )
    .await?;

    Ok(Json(json!({ "user_id": user_id })))
}
