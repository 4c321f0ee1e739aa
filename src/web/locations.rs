use crate::db::{self, EmployeeLocation};
use crate::domain::models::UserRole;
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::{require_admin, UserSession};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct LocationUpdate {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list))
        .route("/:employee_id", post(update))
        .with_state(state)
}

/// Map feed: employees with a known position. Locations are polled, not
/// pushed.
async fn list(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<EmployeeLocation>>, AppError> {
    require_admin(&claims)?;
    Ok(Json(db::employee_locations(&state.pool).await?))
}

/// An employee may report only their own position; admins may correct any.
async fn update(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Path(employee_id): Path<i64>,
    Json(payload): Json<LocationUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    if claims.role == UserRole::Employee {
        let own = db::find_employee_by_user(&state.pool, claims.user_id)
            .await?
            .ok_or(AppError::NotFound("employee profile"))?;
        if own.id != employee_id {
            return Err(AppError::Forbidden);
        }
    }

    db::update_location(
        &state.pool,
        employee_id,
        payload.latitude,
        payload.longitude,
        payload.location.as_deref(),
    )
    .await?;
    Ok(Json(json!({ "message": "location updated" })))
}
