use crate::db::{self, WorkReport, WorkReportInput};
use crate::domain::models::UserRole;
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::{require_employee, UserSession};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct ReportFilter {
    pub employee_id: Option<i64>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .with_state(state)
}

async fn list(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Query(filter): Query<ReportFilter>,
) -> Result<Json<Vec<WorkReport>>, AppError> {
    let scope = match claims.role {
        UserRole::Admin => filter.employee_id,
        UserRole::Employee => {
            let employee = db::find_employee_by_user(&state.pool, claims.user_id)
                .await?
                .ok_or(AppError::NotFound("employee profile"))?;
            Some(employee.id)
        }
    };
    Ok(Json(db::list_work_reports(&state.pool, scope).await?))
}

/// Reports are append-only; the employee is taken from the session, never
/// from the body.
async fn create(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Json(input): Json<WorkReportInput>,
) -> Result<Json<WorkReport>, AppError> {
    require_employee(&claims)?;
    let employee = db::find_employee_by_user(&state.pool, claims.user_id)
        .await?
        .ok_or(AppError::NotFound("employee profile"))?;

    let id = db::add_work_report(&state.pool, employee.id, &input).await?;
    let report = db::list_work_reports(&state.pool, Some(employee.id))
        .await?
        .into_iter()
        .find(|r| r.id == id)
        .ok_or(AppError::NotFound("work report"))?;
    Ok(Json(report))
}
