use crate::db::{self, Employee, EmployeeInput};
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::{require_admin, UserSession};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Deserialize)]
pub struct CreateEmployeePayload {
    #[serde(flatten)]
    pub employee: EmployeeInput,
    pub password: String,
}

#[derive(Serialize)]
pub struct CreatedEmployee {
    pub employee_id: i64,
    pub user_id: i64,
    pub username: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(delete))
        .with_state(state)
}

async fn list(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Employee>>, AppError> {
    require_admin(&claims)?;
    Ok(Json(db::list_employees(&state.pool).await?))
}

async fn get_one(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Employee>, AppError> {
    require_admin(&claims)?;
    let employee = db::find_employee(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("employee"))?;
    Ok(Json(employee))
}

/// Creates the roster record and its login in one transaction; a duplicate
/// account rolls the employee insert back.
async fn create(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<CreateEmployeePayload>,
) -> Result<Json<CreatedEmployee>, AppError> {
    require_admin(&claims)?;
    if payload.password.is_empty() {
        return Err(AppError::Validation("password is required".into()));
    }

    // The employee logs in with their email, as with the original roster.
    let username = payload.employee.email.clone();
    let hash = db::hash_password(&payload.password)?;
    let (employee_id, user_id) =
        db::create_employee_with_user(&state.pool, &payload.employee, &username, &hash).await?;

    tracing::info!("Employee {} added by {}", payload.employee.name, claims.username);
    Ok(Json(CreatedEmployee {
        employee_id,
        user_id,
        username,
    }))
}

async fn update(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(input): Json<EmployeeInput>,
) -> Result<Json<Employee>, AppError> {
    require_admin(&claims)?;
    db::update_employee(&state.pool, id, &input).await?;
    let employee = db::find_employee(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("employee"))?;
    Ok(Json(employee))
}

async fn delete(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&claims)?;
    db::delete_employee(&state.pool, id).await?;
    tracing::info!("Employee {id} deleted by {}", claims.username);
    Ok(Json(json!({ "message": "employee deleted" })))
}
