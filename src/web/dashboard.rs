use crate::db::{self, stats, Employee, Task, WorkReport};
use crate::domain::models::UserRole;
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct CurrentUser {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
    pub display_name: String,
}

#[derive(Serialize)]
pub struct AdminDashboard {
    pub stats: stats::GlobalStats,
    pub recent_tasks: Vec<Task>,
    pub employees: Vec<Employee>,
}

#[derive(Serialize)]
pub struct EmployeeDashboard {
    pub employee: Employee,
    pub stats: stats::EmployeeStats,
    pub tasks: Vec<Task>,
    pub recent_reports: Vec<WorkReport>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/me", get(current_user))
        .with_state(state)
}

/// Identity snapshot for the frontend, straight from the verified session.
async fn current_user(UserSession(claims): UserSession) -> Json<CurrentUser> {
    Json(CurrentUser {
        user_id: claims.user_id,
        username: claims.username,
        role: claims.role,
        display_name: claims.display_name,
    })
}

async fn dashboard(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
) -> Result<Response, AppError> {
    match claims.role {
        UserRole::Admin => {
            let stats = stats::global_stats(&state.pool).await?;
            let mut recent_tasks = db::list_tasks(&state.pool, None).await?;
            recent_tasks.truncate(5);
            let employees = db::list_employees(&state.pool).await?;
            Ok(Json(AdminDashboard {
                stats,
                recent_tasks,
                employees,
            })
            .into_response())
        }
        UserRole::Employee => {
            let employee = db::find_employee_by_user(&state.pool, claims.user_id)
                .await?
                .ok_or(AppError::NotFound("employee profile"))?;
            let stats = stats::employee_stats(&state.pool, employee.id).await?;
            let mut tasks = db::list_tasks(&state.pool, Some(employee.id)).await?;
            tasks.truncate(5);
            let mut recent_reports = db::list_work_reports(&state.pool, Some(employee.id)).await?;
            recent_reports.truncate(3);
            Ok(Json(EmployeeDashboard {
                employee,
                stats,
                tasks,
                recent_reports,
            })
            .into_response())
        }
    }
}
