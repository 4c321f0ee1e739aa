use crate::db::{self, EmployeeInput, TaskInput, WorkReportInput};
use crate::domain::models::UserRole;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_EMPLOYEE_PASSWORD: &str = "employee123";

struct SeedEmployee<'a> {
    name: &'a str,
    position: &'a str,
    department: &'a str,
    phone: &'a str,
    email: &'a str,
    location: &'a str,
    status: &'a str,
}

/// Bootstrap sample data. Guarded solely on the existence of an admin user:
/// once one exists, startup never seeds again.
pub async fn seed_all(pool: &SqlitePool) -> Result<()> {
    if db::admin_exists(pool).await? {
        return Ok(());
    }
    tracing::info!("No admin user found, seeding sample data");

    let admin_hash = db::hash_password(DEFAULT_ADMIN_PASSWORD)?;
    db::register_user(pool, "admin", &admin_hash, "admin@company.com", UserRole::Admin, None)
        .await?;

    let employees = [
        SeedEmployee {
            name: "James Carter",
            position: "Sales Manager",
            department: "Sales",
            phone: "+1 (555) 011-0001",
            email: "carter@company.com",
            location: "Chicago",
            status: "active",
        },
        SeedEmployee {
            name: "Peter Novak",
            position: "Courier",
            department: "Logistics",
            phone: "+1 (555) 011-0002",
            email: "novak@company.com",
            location: "Boston",
            status: "on_mission",
        },
        SeedEmployee {
            name: "Maria Santos",
            position: "Sales Representative",
            department: "Sales",
            phone: "+1 (555) 011-0003",
            email: "santos@company.com",
            location: "Austin",
            status: "active",
        },
        SeedEmployee {
            name: "Alan Reed",
            position: "Service Engineer",
            department: "Engineering",
            phone: "+1 (555) 011-0004",
            email: "reed@company.com",
            location: "Denver",
            status: "active",
        },
    ];

    let mut employee_ids = Vec::new();
    for emp in &employees {
        let input = EmployeeInput {
            name: emp.name.to_string(),
            position: emp.position.to_string(),
            department: Some(emp.department.to_string()),
            phone: emp.phone.to_string(),
            email: emp.email.to_string(),
            location: Some(emp.location.to_string()),
            status: emp.status.to_string(),
            hourly_rate: 25.0,
            work_schedule: None,
            current_task: None,
        };
        // Username is the local part of the email; the well-known default
        // password is hashed per user and never logged.
        let username = emp.email.split('@').next().unwrap_or(emp.email);
        let hash = db::hash_password(DEFAULT_EMPLOYEE_PASSWORD)?;
        let (employee_id, _) = db::create_employee_with_user(pool, &input, username, &hash).await?;
        tracing::info!("Seeded employee {} (login {})", emp.name, username);
        employee_ids.push(employee_id);
    }

    let tasks: [(&str, &str, usize, &str, (i32, u32, u32)); 6] = [
        ("Deliver documents", "Drop the contract package at the downtown office", 0, "high", (2024, 1, 20)),
        ("Client meeting", "Product presentation for the TechnoPro account", 1, "medium", (2024, 1, 18)),
        ("Equipment maintenance", "Scheduled maintenance of the server room hardware", 2, "low", (2024, 1, 25)),
        ("Purchase supplies", "Restock office consumables from the approved list", 3, "medium", (2024, 1, 22)),
        ("Monthly sales report", "Compile the January sales figures", 0, "high", (2024, 1, 31)),
        ("Onboard new hire", "Run the intro briefing for the new account manager", 1, "medium", (2024, 1, 19)),
    ];
    for (title, description, emp_idx, priority, (y, m, d)) in tasks {
        let input = TaskInput {
            title: title.to_string(),
            description: Some(description.to_string()),
            employee_id: employee_ids[emp_idx],
            priority: priority.to_string(),
            due_date: NaiveDate::from_ymd_opt(y, m, d),
        };
        db::create_task(pool, &input, None).await?;
    }

    let today = Utc::now().date_naive();
    let reports: [(usize, f64, i64, &str); 4] = [
        (0, 8.0, 3, "Client calls and contract drafting"),
        (1, 6.0, 2, "Deliveries along the north route"),
        (2, 7.0, 4, "Partner meetings and negotiations"),
        (3, 8.0, 3, "Hardware repair and diagnostics"),
    ];
    for (emp_idx, hours, tasks_done, description) in reports {
        let input = WorkReportInput {
            date: today,
            hours_worked: hours,
            tasks_completed: tasks_done,
            description: Some(description.to_string()),
        };
        db::add_work_report(pool, employee_ids[emp_idx], &input).await?;
    }

    tracing::info!("Seed complete: 1 admin, {} employees", employees.len());
    Ok(())
}
