use crate::db::{self, stats};
use crate::domain::models::UserRole;
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::{require_admin, UserSession};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

/// Per-employee analytics row for the admin view.
#[derive(Serialize)]
pub struct EmployeeAnalytics {
    pub id: i64,
    pub name: String,
    pub position: String,
    #[serde(flatten)]
    pub stats: stats::EmployeeStats,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(overview))
        .route("/employees", get(per_employee))
        .with_state(state)
}

/// Admins get the global counters; employees get their own scoped stats.
async fn overview(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
) -> Result<Response, AppError> {
    match claims.role {
        UserRole::Admin => {
            let stats = stats::global_stats(&state.pool).await?;
            Ok(Json(stats).into_response())
        }
        UserRole::Employee => {
            let employee = db::find_employee_by_user(&state.pool, claims.user_id)
                .await?
                .ok_or(AppError::NotFound("employee profile"))?;
            let stats = stats::employee_stats(&state.pool, employee.id).await?;
            Ok(Json(stats).into_response())
        }
    }
}

async fn per_employee(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<EmployeeAnalytics>>, AppError> {
    require_admin(&claims)?;

    let employees = db::list_employees(&state.pool).await?;
    let mut out = Vec::with_capacity(employees.len());
    for employee in employees {
        let stats = stats::employee_stats(&state.pool, employee.id).await?;
        out.push(EmployeeAnalytics {
            id: employee.id,
            name: employee.name,
            position: employee.position,
            stats,
        });
    }
    Ok(Json(out))
}
