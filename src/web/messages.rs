use crate::db::{self, Message};
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct SendMessagePayload {
    pub receiver_id: i64,
    #[serde(default)]
    pub subject: Option<String>,
    pub content: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", post(send))
        .route("/inbox", get(inbox))
        .route("/outbox", get(outbox))
        .route("/:id/read", post(mark_read))
        .with_state(state)
}

async fn send(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::Validation("message content is required".into()));
    }

    let id = db::send_message(
        &state.pool,
        claims.user_id,
        payload.receiver_id,
        payload.subject.as_deref(),
        &payload.content,
    )
    .await?;
    Ok(Json(json!({ "message_id": id })))
}

async fn inbox(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(db::inbox(&state.pool, claims.user_id).await?))
}

async fn outbox(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(db::outbox(&state.pool, claims.user_id).await?))
}

async fn mark_read(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    db::mark_message_read(&state.pool, id, claims.user_id).await?;
    Ok(Json(json!({ "message": "marked as read" })))
}
