use crate::db::{self, stats, Employee, ProfileInput};
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::{require_employee, SessionClaims, UserSession};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Serialize)]
pub struct ProfileView {
    pub employee: Employee,
    pub stats: stats::EmployeeStats,
}

#[derive(Deserialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(view).put(update))
        .route("/password", post(change_password))
        .with_state(state)
}

async fn own_employee(state: &SharedState, claims: &SessionClaims) -> Result<Employee, AppError> {
    db::find_employee_by_user(&state.pool, claims.user_id)
        .await?
        .ok_or(AppError::NotFound("employee profile"))
}

async fn view(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<ProfileView>, AppError> {
    require_employee(&claims)?;
    let employee = own_employee(&state, &claims).await?;
    let stats = stats::employee_stats(&state.pool, employee.id).await?;
    Ok(Json(ProfileView { employee, stats }))
}

/// Self-service update of the employee's own record; a non-empty
/// `new_password` also rotates the login credential.
async fn update(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Json(input): Json<ProfileInput>,
) -> Result<Json<Employee>, AppError> {
    require_employee(&claims)?;
    let employee = own_employee(&state, &claims).await?;

    db::update_employee_profile(&state.pool, employee.id, &input).await?;

    if let Some(new_password) = input.new_password.as_deref() {
        if !new_password.trim().is_empty() {
            let hash = db::hash_password(new_password)?;
            db::update_user_password(&state.pool, claims.user_id, &hash).await?;
        }
    }

    let updated = own_employee(&state, &claims).await?;
    Ok(Json(updated))
}

async fn change_password(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<PasswordChange>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_employee(&claims)?;
    if payload.old_password.is_empty() || payload.new_password.is_empty() {
        return Err(AppError::Validation("all fields are required".into()));
    }

    let user = db::find_user_by_id(&state.pool, claims.user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    if !db::verify_password(&payload.old_password, &user.password) {
        return Err(AppError::Validation("old password is incorrect".into()));
    }

    let hash = db::hash_password(&payload.new_password)?;
    db::update_user_password(&state.pool, claims.user_id, &hash).await?;
    Ok(Json(json!({ "message": "password changed" })))
}
