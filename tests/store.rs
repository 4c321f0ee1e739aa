use chrono::{Datelike, NaiveDate};
use fieldtrack::db::{self, seed, stats, EmployeeInput, TaskInput, WorkReportInput};
use fieldtrack::domain::models::{TaskStatus, UserRole};
use fieldtrack::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Single-connection in-memory store; more connections would each see their
/// own empty database.
async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    db::MIGRATOR.run(&pool).await.unwrap();
    pool
}

fn sample_employee(name: &str, phone: &str, email: &str) -> EmployeeInput {
    EmployeeInput {
        name: name.to_string(),
        position: "Courier".to_string(),
        department: Some("Logistics".to_string()),
        phone: phone.to_string(),
        email: email.to_string(),
        location: Some("Chicago".to_string()),
        status: "active".to_string(),
        hourly_rate: 20.0,
        work_schedule: None,
        current_task: None,
    }
}

#[tokio::test]
async fn duplicate_username_fails_and_leaves_one_user() {
    let pool = test_pool().await;
    let hash = db::hash_password("pw-one").unwrap();

    db::register_user(&pool, "ivanov", &hash, "ivanov@x.com", UserRole::Employee, None)
        .await
        .unwrap();
    let err = db::register_user(&pool, "ivanov", &hash, "other@x.com", UserRole::Employee, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = 'ivanov'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn duplicate_email_fails_registration() {
    let pool = test_pool().await;
    let hash = db::hash_password("pw").unwrap();

    db::register_user(&pool, "first", &hash, "shared@x.com", UserRole::Employee, None)
        .await
        .unwrap();
    let err = db::register_user(&pool, "second", &hash, "shared@x.com", UserRole::Employee, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));
}

#[tokio::test]
async fn deleting_employee_cascades_tasks_reports_and_nulls_user() {
    let pool = test_pool().await;
    let hash = db::hash_password("pw").unwrap();

    let input = sample_employee("Peter Novak", "+1-100", "novak@x.com");
    let (employee_id, user_id) =
        db::create_employee_with_user(&pool, &input, "novak", &hash).await.unwrap();

    let task = TaskInput {
        title: "Route delivery".to_string(),
        description: None,
        employee_id,
        priority: "medium".to_string(),
        due_date: NaiveDate::from_ymd_opt(2024, 3, 1),
    };
    db::create_task(&pool, &task, None).await.unwrap();

    let report = WorkReportInput {
        date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        hours_worked: 6.0,
        tasks_completed: 2,
        description: None,
    };
    db::add_work_report(&pool, employee_id, &report).await.unwrap();

    db::delete_employee(&pool, employee_id).await.unwrap();

    let tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE employee_id = ?")
        .bind(employee_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let reports: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM work_reports WHERE employee_id = ?")
            .bind(employee_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(tasks, 0);
    assert_eq!(reports, 0);

    let user = db::find_user_by_id(&pool, user_id).await.unwrap().unwrap();
    assert_eq!(user.employee_id, None);
}

#[tokio::test]
async fn completing_stamps_and_other_statuses_clear() {
    let pool = test_pool().await;
    let hash = db::hash_password("pw").unwrap();
    let input = sample_employee("Maria Santos", "+1-200", "santos@x.com");
    let (employee_id, _) =
        db::create_employee_with_user(&pool, &input, "santos", &hash).await.unwrap();

    let task = TaskInput {
        title: "Partner visit".to_string(),
        description: None,
        employee_id,
        priority: "high".to_string(),
        due_date: None,
    };
    let task_id = db::create_task(&pool, &task, None).await.unwrap();

    let done = db::set_task_status(&pool, task_id, TaskStatus::Completed, Some("all good"))
        .await
        .unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert!(done.completed_at.is_some());
    assert_eq!(done.feedback.as_deref(), Some("all good"));

    let reopened = db::set_task_status(&pool, task_id, TaskStatus::InProgress, None)
        .await
        .unwrap();
    assert_eq!(reopened.status, TaskStatus::InProgress);
    assert!(reopened.completed_at.is_none());
}

#[tokio::test]
async fn recompleting_keeps_original_stamp() {
    let pool = test_pool().await;
    let hash = db::hash_password("pw").unwrap();
    let input = sample_employee("Alan Reed", "+1-300", "reed@x.com");
    let (employee_id, _) =
        db::create_employee_with_user(&pool, &input, "reed", &hash).await.unwrap();

    let task = TaskInput {
        title: "Diagnostics".to_string(),
        description: None,
        employee_id,
        priority: "low".to_string(),
        due_date: None,
    };
    let task_id = db::create_task(&pool, &task, None).await.unwrap();

    let first = db::set_task_status(&pool, task_id, TaskStatus::Completed, None)
        .await
        .unwrap();
    let second = db::set_task_status(&pool, task_id, TaskStatus::Completed, Some("verified"))
        .await
        .unwrap();
    assert_eq!(first.completed_at, second.completed_at);
    assert_eq!(second.feedback.as_deref(), Some("verified"));
}

#[tokio::test]
async fn efficiency_is_zero_on_empty_store_and_percentage_otherwise() {
    let pool = test_pool().await;

    let empty = stats::global_stats(&pool).await.unwrap();
    assert_eq!(empty.efficiency, 0.0);
    assert_eq!(empty.total_reports, 0);

    let hash = db::hash_password("pw").unwrap();
    let input = sample_employee("James Carter", "+1-400", "carter@x.com");
    let (employee_id, _) =
        db::create_employee_with_user(&pool, &input, "carter", &hash).await.unwrap();

    let report = WorkReportInput {
        date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        hours_worked: 8.0,
        tasks_completed: 4,
        description: None,
    };
    db::add_work_report(&pool, employee_id, &report).await.unwrap();

    let stats = stats::global_stats(&pool).await.unwrap();
    assert_eq!(stats.total_employees, 1);
    assert_eq!(stats.active_employees, 1);
    assert_eq!(stats.total_reports, 1);
    assert_eq!(stats.efficiency, 50.0);
}

#[tokio::test]
async fn negative_report_values_are_rejected() {
    let pool = test_pool().await;
    let hash = db::hash_password("pw").unwrap();
    let input = sample_employee("Jane Doe", "+1-500", "doe@x.com");
    let (employee_id, _) =
        db::create_employee_with_user(&pool, &input, "doe", &hash).await.unwrap();

    let bad_hours = WorkReportInput {
        date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        hours_worked: -1.0,
        tasks_completed: 0,
        description: None,
    };
    assert!(matches!(
        db::add_work_report(&pool, employee_id, &bad_hours).await.unwrap_err(),
        AppError::Validation(_)
    ));

    let bad_tasks = WorkReportInput {
        date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        hours_worked: 1.0,
        tasks_completed: -2,
        description: None,
    };
    assert!(matches!(
        db::add_work_report(&pool, employee_id, &bad_tasks).await.unwrap_err(),
        AppError::Validation(_)
    ));
}

#[tokio::test]
async fn authentication_truth_table() {
    let pool = test_pool().await;
    let hash = db::hash_password("secret").unwrap();
    db::register_user(&pool, "kozlov", &hash, "kozlov@x.com", UserRole::Employee, None)
        .await
        .unwrap();

    let ok = db::authenticate(&pool, "kozlov", "secret").await.unwrap();
    assert!(ok.is_some());
    assert_eq!(ok.unwrap().username, "kozlov");

    let wrong = db::authenticate(&pool, "kozlov", "wrong").await.unwrap();
    assert!(wrong.is_none());

    let unknown = db::authenticate(&pool, "nobody", "secret").await.unwrap();
    assert!(unknown.is_none());
}

#[tokio::test]
async fn login_joins_linked_employee_for_display() {
    let pool = test_pool().await;
    let hash = db::hash_password("pw").unwrap();
    let input = sample_employee("Peter Novak", "+1-600", "pnovak@x.com");
    db::create_employee_with_user(&pool, &input, "pnovak", &hash).await.unwrap();

    let auth = db::authenticate(&pool, "pnovak", "pw").await.unwrap().unwrap();
    assert_eq!(auth.display_name.as_deref(), Some("Peter Novak"));
    assert_eq!(auth.position.as_deref(), Some("Courier"));
    assert_eq!(auth.role, UserRole::Employee);
}

#[tokio::test]
async fn employee_task_lifecycle_end_to_end() {
    let pool = test_pool().await;
    let hash = db::hash_password("pw").unwrap();

    let input = sample_employee("A", "+1-000", "a@x.com");
    let (employee_id, user_id) =
        db::create_employee_with_user(&pool, &input, "a", &hash).await.unwrap();
    let user = db::find_user_by_id(&pool, user_id).await.unwrap().unwrap();
    assert_eq!(user.employee_id, Some(employee_id));

    let task = TaskInput {
        title: "T1".to_string(),
        description: None,
        employee_id,
        priority: "high".to_string(),
        due_date: NaiveDate::from_ymd_opt(2024, 2, 1),
    };
    let task_id = db::create_task(&pool, &task, None).await.unwrap();
    db::set_task_status(&pool, task_id, TaskStatus::Completed, Some("done"))
        .await
        .unwrap();

    let tasks = db::list_tasks(&pool, Some(employee_id)).await.unwrap();
    assert_eq!(tasks.len(), 1);
    let t1 = &tasks[0];
    assert_eq!(t1.title, "T1");
    assert_eq!(t1.status, TaskStatus::Completed);
    assert!(t1.completed_at.is_some());
    assert_eq!(t1.feedback.as_deref(), Some("done"));
    assert_eq!(t1.employee_name.as_deref(), Some("A"));
}

#[tokio::test]
async fn work_report_feeds_employee_stats() {
    let pool = test_pool().await;
    let hash = db::hash_password("pw").unwrap();
    let input = sample_employee("A", "+1-000", "a@x.com");
    let (employee_id, _) = db::create_employee_with_user(&pool, &input, "a", &hash).await.unwrap();

    let report = WorkReportInput {
        date: NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
        hours_worked: 8.0,
        tasks_completed: 4,
        description: Some("field visits".to_string()),
    };
    db::add_work_report(&pool, employee_id, &report).await.unwrap();

    let stats = stats::employee_stats(&pool, employee_id).await.unwrap();
    assert!(stats.total_hours >= 8.0);
    assert!(stats.total_reports >= 1);
    assert_eq!(stats.avg_tasks_per_report, 4.0);
}

#[tokio::test]
async fn reports_list_newest_first() {
    let pool = test_pool().await;
    let hash = db::hash_password("pw").unwrap();
    let input = sample_employee("B", "+1-700", "b@x.com");
    let (employee_id, _) = db::create_employee_with_user(&pool, &input, "b", &hash).await.unwrap();

    for (day, hours) in [(1, 4.0), (3, 8.0), (2, 6.0)] {
        let report = WorkReportInput {
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            hours_worked: hours,
            tasks_completed: 1,
            description: None,
        };
        db::add_work_report(&pool, employee_id, &report).await.unwrap();
    }

    let reports = db::list_work_reports(&pool, Some(employee_id)).await.unwrap();
    let dates: Vec<_> = reports.iter().map(|r| r.date.day()).collect();
    assert_eq!(dates, vec![3, 2, 1]);
}

#[tokio::test]
async fn duplicate_linked_user_rolls_back_employee_insert() {
    let pool = test_pool().await;
    let hash = db::hash_password("pw").unwrap();
    db::register_user(&pool, "taken", &hash, "taken@x.com", UserRole::Employee, None)
        .await
        .unwrap();

    // Distinct employee phone/email, but the username collides.
    let input = sample_employee("C", "+1-800", "c@x.com");
    let err = db::create_employee_with_user(&pool, &input, "taken", &hash)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));

    let employees: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(employees, 0);
}

#[tokio::test]
async fn messages_flow_between_users() {
    let pool = test_pool().await;
    let hash = db::hash_password("pw").unwrap();
    let sender = db::register_user(&pool, "office", &hash, "office@x.com", UserRole::Admin, None)
        .await
        .unwrap();
    let receiver =
        db::register_user(&pool, "field", &hash, "field@x.com", UserRole::Employee, None)
            .await
            .unwrap();

    let msg_id = db::send_message(&pool, sender, receiver, Some("Schedule"), "New route tomorrow")
        .await
        .unwrap();

    let inbox = db::inbox(&pool, receiver).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].counterpart, "office");
    assert!(!inbox[0].is_read);

    let outbox = db::outbox(&pool, sender).await.unwrap();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].counterpart, "field");

    // Only the receiver may mark it read.
    assert!(matches!(
        db::mark_message_read(&pool, msg_id, sender).await.unwrap_err(),
        AppError::Forbidden
    ));
    db::mark_message_read(&pool, msg_id, receiver).await.unwrap();
    let inbox = db::inbox(&pool, receiver).await.unwrap();
    assert!(inbox[0].is_read);

    assert!(matches!(
        db::send_message(&pool, sender, 9999, None, "hello").await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn seed_runs_once_guarded_on_admin_presence() {
    let pool = test_pool().await;

    seed::seed_all(&pool).await.unwrap();
    seed::seed_all(&pool).await.unwrap();

    let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(admins, 1);

    let employees = db::list_employees(&pool).await.unwrap();
    assert_eq!(employees.len(), 4);
    // Usernames come from the email local part.
    let auth = db::authenticate(&pool, "carter", "employee123").await.unwrap();
    assert!(auth.is_some());

    let stats = stats::global_stats(&pool).await.unwrap();
    assert_eq!(stats.total_tasks, 6);
    assert_eq!(stats.tasks_pending, 6);
    assert_eq!(stats.total_reports, 4);
}
