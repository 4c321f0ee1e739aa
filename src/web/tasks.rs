use crate::db::{self, Task, TaskInput};
use crate::domain::models::{TaskStatus, UserRole};
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::{require_admin, SessionClaims, UserSession};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct TaskFilter {
    pub employee_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: TaskStatus,
    #[serde(default)]
    pub feedback: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).delete(delete))
        .route("/:id/status", post(set_status))
        .with_state(state)
}

/// Resolve the employee record owned by the session user. Employee-role
/// accounts without a roster record cannot act on tasks or reports.
async fn own_employee_id(state: &SharedState, claims: &SessionClaims) -> Result<i64, AppError> {
    let employee = db::find_employee_by_user(&state.pool, claims.user_id)
        .await?
        .ok_or(AppError::NotFound("employee profile"))?;
    Ok(employee.id)
}

/// Admins see everything (optionally filtered); employees see their own
/// queue only, ordered by due date.
async fn list(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<Task>>, AppError> {
    let scope = match claims.role {
        UserRole::Admin => filter.employee_id,
        UserRole::Employee => Some(own_employee_id(&state, &claims).await?),
    };
    Ok(Json(db::list_tasks(&state.pool, scope).await?))
}

async fn get_one(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, AppError> {
    let task = db::find_task(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("task"))?;
    if claims.role == UserRole::Employee {
        let own = own_employee_id(&state, &claims).await?;
        if task.employee_id != own {
            return Err(AppError::Forbidden);
        }
    }
    Ok(Json(task))
}

async fn create(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Json(input): Json<TaskInput>,
) -> Result<Json<Task>, AppError> {
    require_admin(&claims)?;
    let id = db::create_task(&state.pool, &input, Some(claims.user_id)).await?;
    let task = db::find_task(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("task"))?;
    Ok(Json(task))
}

/// Status transition: admins may move any task, employees only their own.
async fn set_status(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Task>, AppError> {
    if claims.role == UserRole::Employee {
        let task = db::find_task(&state.pool, id)
            .await?
            .ok_or(AppError::NotFound("task"))?;
        let own = own_employee_id(&state, &claims).await?;
        if task.employee_id != own {
            return Err(AppError::Forbidden);
        }
    }

    let task =
        db::set_task_status(&state.pool, id, update.status, update.feedback.as_deref()).await?;
    Ok(Json(task))
}

async fn delete(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&claims)?;
    db::delete_task(&state.pool, id).await?;
    Ok(Json(json!({ "message": "task deleted" })))
}
