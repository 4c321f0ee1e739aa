//! Read-side aggregations. Nothing is cached; every call computes fresh
//! counts from the store.

use crate::error::AppError;
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Serialize)]
pub struct GlobalStats {
    pub total_employees: i64,
    pub active_employees: i64,
    pub on_mission: i64,
    pub total_tasks: i64,
    pub tasks_pending: i64,
    pub tasks_completed: i64,
    pub total_reports: i64,
    pub efficiency: f64,
}

#[derive(Debug, Serialize)]
pub struct EmployeeStats {
    pub total_tasks: i64,
    pub tasks_pending: i64,
    pub tasks_completed: i64,
    pub total_reports: i64,
    pub total_hours: f64,
    pub avg_tasks_per_report: f64,
}

/// Reported tasks per hour, as a percentage rounded to two decimals.
/// Zero when no hours have been reported, so an empty store never divides
/// by zero.
pub fn efficiency(tasks_completed: f64, hours_worked: f64) -> f64 {
    if hours_worked <= 0.0 {
        return 0.0;
    }
    round2(tasks_completed / hours_worked * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub async fn global_stats(pool: &SqlitePool) -> Result<GlobalStats, AppError> {
    let total_employees: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(pool)
        .await?;
    let active_employees: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE status = 'active'")
            .fetch_one(pool)
            .await?;
    let on_mission: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE status = 'on_mission'")
            .fetch_one(pool)
            .await?;
    let total_tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(pool)
        .await?;
    let tasks_pending: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE status = 'pending'")
            .fetch_one(pool)
            .await?;
    let tasks_completed: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE status = 'completed'")
            .fetch_one(pool)
            .await?;
    let total_reports: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM work_reports")
        .fetch_one(pool)
        .await?;

    let total_hours: Option<f64> = sqlx::query_scalar("SELECT SUM(hours_worked) FROM work_reports")
        .fetch_one(pool)
        .await?;
    let reported_tasks: Option<i64> =
        sqlx::query_scalar("SELECT SUM(tasks_completed) FROM work_reports")
            .fetch_one(pool)
            .await?;

    Ok(GlobalStats {
        total_employees,
        active_employees,
        on_mission,
        total_tasks,
        tasks_pending,
        tasks_completed,
        total_reports,
        efficiency: efficiency(reported_tasks.unwrap_or(0) as f64, total_hours.unwrap_or(0.0)),
    })
}

pub async fn employee_stats(
    pool: &SqlitePool,
    employee_id: i64,
) -> Result<EmployeeStats, AppError> {
    let total_tasks: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE employee_id = ?")
            .bind(employee_id)
            .fetch_one(pool)
            .await?;
    let tasks_pending: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks WHERE employee_id = ? AND status = 'pending'",
    )
    .bind(employee_id)
    .fetch_one(pool)
    .await?;
    let tasks_completed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks WHERE employee_id = ? AND status = 'completed'",
    )
    .bind(employee_id)
    .fetch_one(pool)
    .await?;
    let total_reports: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM work_reports WHERE employee_id = ?")
            .bind(employee_id)
            .fetch_one(pool)
            .await?;
    let total_hours: Option<f64> =
        sqlx::query_scalar("SELECT SUM(hours_worked) FROM work_reports WHERE employee_id = ?")
            .bind(employee_id)
            .fetch_one(pool)
            .await?;
    let avg_tasks: Option<f64> =
        sqlx::query_scalar("SELECT AVG(tasks_completed) FROM work_reports WHERE employee_id = ?")
            .bind(employee_id)
            .fetch_one(pool)
            .await?;

    Ok(EmployeeStats {
        total_tasks,
        tasks_pending,
        tasks_completed,
        total_reports,
        total_hours: total_hours.unwrap_or(0.0),
        avg_tasks_per_report: round2(avg_tasks.unwrap_or(0.0)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efficiency_is_zero_without_hours() {
        assert_eq!(efficiency(0.0, 0.0), 0.0);
        assert_eq!(efficiency(5.0, 0.0), 0.0);
    }

    #[test]
    fn efficiency_is_percentage() {
        assert_eq!(efficiency(4.0, 8.0), 50.0);
        assert_eq!(efficiency(12.0, 8.0), 150.0);
    }

    #[test]
    fn efficiency_rounds_to_two_decimals() {
        assert_eq!(efficiency(1.0, 3.0), 33.33);
        assert_eq!(efficiency(2.0, 3.0), 66.67);
    }
}
