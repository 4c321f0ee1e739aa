pub mod seed;
pub mod stats;

use crate::domain::models::{TaskStatus, UserRole};
use crate::error::{duplicate_or, AppError};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Open the pool with foreign keys enabled; the §3 cascades depend on it.
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
}

// ========== Records ==========

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub role: UserRole,
    pub employee_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// User row joined with the linked employee for login display.
#[derive(Debug, FromRow)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub role: UserRole,
    pub employee_id: Option<i64>,
    pub display_name: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub department: Option<String>,
    pub phone: String,
    pub email: String,
    pub location: Option<String>,
    pub status: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub work_schedule: Option<String>,
    pub current_task: Option<String>,
    pub hourly_rate: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct EmployeeLocation {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub employee_id: i64,
    pub manager_id: Option<i64>,
    pub status: TaskStatus,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub feedback: Option<String>,
    pub rating: Option<i64>,
    pub employee_name: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct WorkReport {
    pub id: i64,
    pub employee_id: i64,
    pub date: NaiveDate,
    pub hours_worked: f64,
    pub tasks_completed: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub employee_name: String,
}

/// A message with the username of the other party filled in (the sender for
/// inbox listings, the receiver for outbox listings).
#[derive(Debug, Serialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub subject: Option<String>,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub counterpart: String,
}

// ========== Inputs ==========

fn default_employee_status() -> String {
    "active".to_string()
}

fn default_priority() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize)]
pub struct EmployeeInput {
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub department: Option<String>,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_employee_status")]
    pub status: String,
    #[serde(default)]
    pub hourly_rate: f64,
    #[serde(default)]
    pub work_schedule: Option<String>,
    #[serde(default)]
    pub current_task: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub employee_id: i64,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct WorkReportInput {
    pub date: NaiveDate,
    pub hours_worked: f64,
    pub tasks_completed: i64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileInput {
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub department: Option<String>,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

// ========== Passwords ==========

pub fn hash_password(raw: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(rand_core::OsRng);
    Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(raw: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(raw.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// ========== Users & authentication ==========

/// Credential check: username lookup joined to the linked employee, then a
/// digest comparison. `Ok(None)` on unknown username or mismatch.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<AuthUser>, AppError> {
    let user = sqlx::query_as::<_, AuthUser>(
        r#"
        SELECT
            u.id, u.username, u.password, u.email, u.role, u.employee_id,
            e.name AS display_name, e.position AS position
        FROM users u
        LEFT JOIN employees e ON u.employee_id = e.id
        WHERE u.username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    match user {
        Some(u) if verify_password(password, &u.password) => Ok(Some(u)),
        _ => Ok(None),
    }
}

pub async fn register_user(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    email: &str,
    role: UserRole,
    employee_id: Option<i64>,
) -> Result<i64, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password, email, role, employee_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(email)
    .bind(role)
    .bind(employee_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| duplicate_or(e, "username or email"))?;
    Ok(result.last_insert_rowid())
}

pub async fn find_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<DbUser>, AppError> {
    let user = sqlx::query_as::<_, DbUser>(
        "SELECT id, username, password, email, role, employee_id, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_employee(
    pool: &SqlitePool,
    employee_id: i64,
) -> Result<Option<DbUser>, AppError> {
    let user = sqlx::query_as::<_, DbUser>(
        "SELECT id, username, password, email, role, employee_id, created_at FROM users WHERE employee_id = ?",
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn update_user_password(
    pool: &SqlitePool,
    user_id: i64,
    password_hash: &str,
) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(password_hash)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("user"));
    }
    Ok(())
}

pub async fn admin_exists(pool: &SqlitePool) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

// ========== Employees ==========

const EMPLOYEE_COLUMNS: &str = "id, name, position, department, phone, email, location, status, \
     latitude, longitude, work_schedule, current_task, hourly_rate, created_at";

pub async fn list_employees(pool: &SqlitePool) -> Result<Vec<Employee>, AppError> {
    let employees = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(employees)
}

pub async fn find_employee(pool: &SqlitePool, id: i64) -> Result<Option<Employee>, AppError> {
    let employee = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(employee)
}

pub async fn find_employee_by_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<Employee>, AppError> {
    let employee = sqlx::query_as::<_, Employee>(
        r#"
        SELECT e.id, e.name, e.position, e.department, e.phone, e.email, e.location,
               e.status, e.latitude, e.longitude, e.work_schedule, e.current_task,
               e.hourly_rate, e.created_at
        FROM employees e
        JOIN users u ON e.id = u.employee_id
        WHERE u.id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(employee)
}

/// Insert an employee and its linked login in one transaction. A duplicate
/// username/email on the user side rolls back the employee insert, so no
/// orphaned employee survives a failed registration.
pub async fn create_employee_with_user(
    pool: &SqlitePool,
    input: &EmployeeInput,
    username: &str,
    password_hash: &str,
) -> Result<(i64, i64), AppError> {
    if input.hourly_rate < 0.0 {
        return Err(AppError::Validation("hourly_rate must be non-negative".into()));
    }

    let mut tx = pool.begin().await?;

    let employee = sqlx::query(
        r#"
        INSERT INTO employees
            (name, position, department, phone, email, location, status,
             work_schedule, current_task, hourly_rate, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.name)
    .bind(&input.position)
    .bind(&input.department)
    .bind(&input.phone)
    .bind(&input.email)
    .bind(&input.location)
    .bind(&input.status)
    .bind(&input.work_schedule)
    .bind(&input.current_task)
    .bind(input.hourly_rate)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await
    .map_err(|e| duplicate_or(e, "employee phone or email"))?;
    let employee_id = employee.last_insert_rowid();

    let user = sqlx::query(
        r#"
        INSERT INTO users (username, password, email, role, employee_id, created_at)
        VALUES (?, ?, ?, 'employee', ?, ?)
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(&input.email)
    .bind(employee_id)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await
    .map_err(|e| duplicate_or(e, "username or email"))?;
    let user_id = user.last_insert_rowid();

    tx.commit().await?;
    Ok((employee_id, user_id))
}

/// Full replace of the mutable employee fields.
pub async fn update_employee(
    pool: &SqlitePool,
    id: i64,
    input: &EmployeeInput,
) -> Result<(), AppError> {
    if input.hourly_rate < 0.0 {
        return Err(AppError::Validation("hourly_rate must be non-negative".into()));
    }

    let result = sqlx::query(
        r#"
        UPDATE employees
        SET name = ?, position = ?, department = ?, phone = ?, email = ?,
            location = ?, status = ?, work_schedule = ?, current_task = ?,
            hourly_rate = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.name)
    .bind(&input.position)
    .bind(&input.department)
    .bind(&input.phone)
    .bind(&input.email)
    .bind(&input.location)
    .bind(&input.status)
    .bind(&input.work_schedule)
    .bind(&input.current_task)
    .bind(input.hourly_rate)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| duplicate_or(e, "employee phone or email"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("employee"));
    }
    Ok(())
}

/// Cascades to the employee's tasks and work reports; the owning user's
/// employee reference is nulled by the schema.
pub async fn delete_employee(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("employee"));
    }
    Ok(())
}

pub async fn update_location(
    pool: &SqlitePool,
    id: i64,
    latitude: Option<f64>,
    longitude: Option<f64>,
    location: Option<&str>,
) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE employees SET latitude = ?, longitude = ?, location = ? WHERE id = ?",
    )
    .bind(latitude)
    .bind(longitude)
    .bind(location)
    .bind(id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("employee"));
    }
    Ok(())
}

pub async fn employee_locations(pool: &SqlitePool) -> Result<Vec<EmployeeLocation>, AppError> {
    let locations = sqlx::query_as::<_, EmployeeLocation>(
        r#"
        SELECT id, name, position, latitude, longitude, status
        FROM employees
        WHERE latitude IS NOT NULL AND longitude IS NOT NULL
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(locations)
}

/// Self-service profile update; the password change, when present, is handled
/// by the caller so the digest never passes through here.
pub async fn update_employee_profile(
    pool: &SqlitePool,
    id: i64,
    input: &ProfileInput,
) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE employees
        SET name = ?, position = ?, department = ?, phone = ?, email = ?, location = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.name)
    .bind(&input.position)
    .bind(&input.department)
    .bind(&input.phone)
    .bind(&input.email)
    .bind(&input.location)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| duplicate_or(e, "employee phone or email"))?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("employee"));
    }
    Ok(())
}

// ========== Tasks ==========

const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.employee_id, t.manager_id, t.status, \
     t.priority, t.due_date, t.created_at, t.completed_at, t.feedback, t.rating, \
     e.name AS employee_name";

pub async fn list_tasks(
    pool: &SqlitePool,
    employee_id: Option<i64>,
) -> Result<Vec<Task>, AppError> {
    let tasks = match employee_id {
        Some(id) => {
            sqlx::query_as::<_, Task>(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks t \
                 LEFT JOIN employees e ON t.employee_id = e.id \
                 WHERE t.employee_id = ? ORDER BY t.due_date"
            ))
            .bind(id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Task>(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks t \
                 LEFT JOIN employees e ON t.employee_id = e.id \
                 ORDER BY t.due_date"
            ))
            .fetch_all(pool)
            .await?
        }
    };
    Ok(tasks)
}

pub async fn find_task(pool: &SqlitePool, id: i64) -> Result<Option<Task>, AppError> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks t \
         LEFT JOIN employees e ON t.employee_id = e.id \
         WHERE t.id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(task)
}

pub async fn create_task(
    pool: &SqlitePool,
    input: &TaskInput,
    manager_id: Option<i64>,
) -> Result<i64, AppError> {
    if find_employee(pool, input.employee_id).await?.is_none() {
        return Err(AppError::NotFound("employee"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO tasks (title, description, employee_id, manager_id, status, priority, due_date, created_at)
        VALUES (?, ?, ?, ?, 'pending', ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.employee_id)
    .bind(manager_id)
    .bind(&input.priority)
    .bind(input.due_date)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Apply a status transition. The `completed_at` side effect is decided by
/// the (current, requested) pair, not by the target string alone.
pub async fn set_task_status(
    pool: &SqlitePool,
    id: i64,
    requested: TaskStatus,
    feedback: Option<&str>,
) -> Result<Task, AppError> {
    use crate::domain::models::{completion_effect, CompletionEffect};

    let current = find_task(pool, id).await?.ok_or(AppError::NotFound("task"))?;

    match completion_effect(current.status, requested) {
        CompletionEffect::Stamp => {
            sqlx::query("UPDATE tasks SET status = ?, completed_at = ?, feedback = ? WHERE id = ?")
                .bind(requested)
                .bind(Utc::now())
                .bind(feedback)
                .bind(id)
                .execute(pool)
                .await?;
        }
        CompletionEffect::Clear => {
            sqlx::query("UPDATE tasks SET status = ?, completed_at = NULL, feedback = ? WHERE id = ?")
                .bind(requested)
                .bind(feedback)
                .bind(id)
                .execute(pool)
                .await?;
        }
        CompletionEffect::Keep => {
            sqlx::query("UPDATE tasks SET status = ?, feedback = ? WHERE id = ?")
                .bind(requested)
                .bind(feedback)
                .bind(id)
                .execute(pool)
                .await?;
        }
    }

    find_task(pool, id).await?.ok_or(AppError::NotFound("task"))
}

pub async fn delete_task(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("task"));
    }
    Ok(())
}

// ========== Work reports ==========

/// Append-only: reports have no update or delete path.
pub async fn add_work_report(
    pool: &SqlitePool,
    employee_id: i64,
    input: &WorkReportInput,
) -> Result<i64, AppError> {
    if input.hours_worked < 0.0 {
        return Err(AppError::Validation("hours_worked must be non-negative".into()));
    }
    if input.tasks_completed < 0 {
        return Err(AppError::Validation("tasks_completed must be non-negative".into()));
    }
    if find_employee(pool, employee_id).await?.is_none() {
        return Err(AppError::NotFound("employee"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO work_reports (employee_id, date, hours_worked, tasks_completed, description, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(input.date)
    .bind(input.hours_worked)
    .bind(input.tasks_completed)
    .bind(&input.description)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn list_work_reports(
    pool: &SqlitePool,
    employee_id: Option<i64>,
) -> Result<Vec<WorkReport>, AppError> {
    const COLUMNS: &str = "wr.id, wr.employee_id, wr.date, wr.hours_worked, \
         wr.tasks_completed, wr.description, wr.created_at, e.name AS employee_name";
    let reports = match employee_id {
        Some(id) => {
            sqlx::query_as::<_, WorkReport>(&format!(
                "SELECT {COLUMNS} FROM work_reports wr \
                 JOIN employees e ON wr.employee_id = e.id \
                 WHERE wr.employee_id = ? ORDER BY wr.date DESC"
            ))
            .bind(id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, WorkReport>(&format!(
                "SELECT {COLUMNS} FROM work_reports wr \
                 JOIN employees e ON wr.employee_id = e.id \
                 ORDER BY wr.date DESC"
            ))
            .fetch_all(pool)
            .await?
        }
    };
    Ok(reports)
}

// ========== Messages ==========

pub async fn send_message(
    pool: &SqlitePool,
    sender_id: i64,
    receiver_id: i64,
    subject: Option<&str>,
    content: &str,
) -> Result<i64, AppError> {
    if find_user_by_id(pool, receiver_id).await?.is_none() {
        return Err(AppError::NotFound("receiver"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO messages (sender_id, receiver_id, subject, content, is_read, created_at)
        VALUES (?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(sender_id)
    .bind(receiver_id)
    .bind(subject)
    .bind(content)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn inbox(pool: &SqlitePool, user_id: i64) -> Result<Vec<Message>, AppError> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT m.id, m.sender_id, m.receiver_id, m.subject, m.content, m.is_read,
               m.created_at, u.username AS counterpart
        FROM messages m
        JOIN users u ON m.sender_id = u.id
        WHERE m.receiver_id = ?
        ORDER BY m.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(messages)
}

pub async fn outbox(pool: &SqlitePool, user_id: i64) -> Result<Vec<Message>, AppError> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT m.id, m.sender_id, m.receiver_id, m.subject, m.content, m.is_read,
               m.created_at, u.username AS counterpart
        FROM messages m
        JOIN users u ON m.receiver_id = u.id
        WHERE m.sender_id = ?
        ORDER BY m.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(messages)
}

/// Only the receiver may mark a message read.
pub async fn mark_message_read(
    pool: &SqlitePool,
    message_id: i64,
    user_id: i64,
) -> Result<(), AppError> {
    let receiver: Option<i64> =
        sqlx::query_scalar("SELECT receiver_id FROM messages WHERE id = ?")
            .bind(message_id)
            .fetch_optional(pool)
            .await?;

    match receiver {
        None => Err(AppError::NotFound("message")),
        Some(r) if r != user_id => Err(AppError::Forbidden),
        Some(_) => {
            sqlx::query("UPDATE messages SET is_read = 1 WHERE id = ?")
                .bind(message_id)
                .execute(pool)
                .await?;
            Ok(())
        }
    }
}
