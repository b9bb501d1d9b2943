//! Sample organisation for local setups, loaded by the `seed` subcommand.
//!
//! Every insert is `INSERT IGNORE` on a unique key, so running it twice
//! changes nothing.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::{info, warn};

use crate::auth::password::hash_password;

struct SeedDivision {
    name: &'static str,
    code: &'static str,
    color: &'static str,
    department: (&'static str, &'static str),
}

const DIVISIONS: [SeedDivision; 3] = [
    SeedDivision {
        name: "Production Division",
        code: "PROD",
        color: "blue",
        department: ("Production Line A", "PROD_A"),
    },
    SeedDivision {
        name: "Quality Assurance",
        code: "QA",
        color: "green",
        department: ("Quality Control", "QC"),
    },
    SeedDivision {
        name: "Maintenance",
        code: "MAINT",
        color: "orange",
        department: ("Mechanical Maintenance", "MECH"),
    },
];

struct SeedUser {
    username: &'static str,
    full_name: &'static str,
    password: &'static str,
    role: &'static str,
    /// Division code; also the department of that division.
    division: Option<&'static str>,
    employee_code: &'static str,
    position: &'static str,
    shift_type: &'static str,
}

const USERS: [SeedUser; 4] = [
    SeedUser {
        username: "admin",
        full_name: "Admin User",
        password: "admin123",
        role: "admin",
        division: None,
        employee_code: "ADM001",
        position: "System Administrator",
        shift_type: "morning",
    },
    SeedUser {
        username: "john.doe",
        full_name: "John Doe",
        password: "password123",
        role: "employee",
        division: Some("PROD"),
        employee_code: "EMP001",
        position: "Production Operator",
        shift_type: "morning",
    },
    SeedUser {
        username: "jane.smith",
        full_name: "Jane Smith",
        password: "password123",
        role: "employee",
        division: Some("QA"),
        employee_code: "EMP002",
        position: "Quality Inspector",
        shift_type: "afternoon",
    },
    SeedUser {
        username: "manager.prod",
        full_name: "Production Manager",
        password: "password123",
        role: "manager",
        division: Some("PROD"),
        employee_code: "MGR001",
        position: "Production Manager",
        shift_type: "morning",
    },
];

/// (name, code, start, end, color)
const SHIFTS: [(&str, &str, (u32, u32), (u32, u32), &str); 2] = [
    ("Morning Shift", "MORN", (8, 0), (16, 0), "blue"),
    ("Afternoon Shift", "AFTN", (16, 0), (0, 0), "green"),
];

/// Employees that get a week of history.
const HISTORY_CODES: [&str; 2] = ["EMP001", "EMP002"];
const HISTORY_DAYS: i64 = 7;

fn avatar_url(full_name: &str) -> String {
    format!(
        "https://api.dicebear.com/7.x/avataaars/svg?seed={}",
        full_name.replace(' ', "")
    )
}

/// One full 08:00 to 16:00 day for each of the last week, oldest last.
fn history(today: NaiveDate) -> Vec<(NaiveDate, NaiveDateTime, NaiveDateTime)> {
    let start = NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN);
    let end = NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN);

    (1..=HISTORY_DAYS)
        .map(|back| {
            let date = today - Duration::days(back);
            (date, date.and_time(start), date.and_time(end))
        })
        .collect()
}

async fn id_by_code(tx: &mut Transaction<'_, MySql>, table: &str, code: &str) -> Result<u64> {
    let sql = format!("SELECT id FROM {table} WHERE code = ?");
    sqlx::query_scalar(&sql)
        .bind(code)
        .fetch_one(&mut **tx)
        .await
        .with_context(|| format!("{table} row {code} missing after insert"))
}

async fn seed_divisions(tx: &mut Transaction<'_, MySql>) -> Result<()> {
    for division in &DIVISIONS {
        sqlx::query("INSERT IGNORE INTO divisions (name, code, color) VALUES (?, ?, ?)")
            .bind(division.name)
            .bind(division.code)
            .bind(division.color)
            .execute(&mut **tx)
            .await
            .with_context(|| format!("inserting division {}", division.code))?;

        let division_id = id_by_code(tx, "divisions", division.code).await?;
        let (name, code) = division.department;
        let exists: Option<u64> = sqlx::query_scalar("SELECT id FROM departments WHERE code = ?")
            .bind(code)
            .fetch_optional(&mut **tx)
            .await?;
        if exists.is_none() {
            sqlx::query("INSERT INTO departments (name, code, division_id) VALUES (?, ?, ?)")
                .bind(name)
                .bind(code)
                .bind(division_id)
                .execute(&mut **tx)
                .await
                .with_context(|| format!("inserting department {code}"))?;
        }
    }
    Ok(())
}

async fn seed_users(tx: &mut Transaction<'_, MySql>, today: NaiveDate) -> Result<()> {
    let hire_date = today - Duration::days(365);

    for seed in &USERS {
        let org = match seed.division {
            Some(code) => {
                let division_id = id_by_code(tx, "divisions", code).await?;
                let department_code = DIVISIONS
                    .iter()
                    .find(|d| d.code == code)
                    .map(|d| d.department.1)
                    .with_context(|| format!("unknown division {code}"))?;
                let department_id = id_by_code(tx, "departments", department_code).await?;
                Some((division_id, department_id))
            }
            None => None,
        };

        let password_hash = hash_password(seed.password)
            .map_err(|e| anyhow::anyhow!("hashing password for {}: {e}", seed.username))?;
        sqlx::query(
            r#"
            INSERT IGNORE INTO users
                (username, email, full_name, password_hash, role, division_id, department_id, avatar_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(seed.username)
        .bind(format!("{}@factory.com", seed.username))
        .bind(seed.full_name)
        .bind(password_hash)
        .bind(seed.role)
        .bind(org.map(|(division, _)| division))
        .bind(org.map(|(_, department)| department))
        .bind(avatar_url(seed.full_name))
        .execute(&mut **tx)
        .await
        .with_context(|| format!("inserting user {}", seed.username))?;

        // admins have no employee record
        let Some((division_id, department_id)) = org else {
            continue;
        };
        let user_id: u64 = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(seed.username)
            .fetch_one(&mut **tx)
            .await?;

        sqlx::query(
            r#"
            INSERT IGNORE INTO employees
                (user_id, employee_code, division_id, department_id, position, hire_date, shift_type)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(seed.employee_code)
        .bind(division_id)
        .bind(department_id)
        .bind(seed.position)
        .bind(hire_date)
        .bind(seed.shift_type)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("inserting employee {}", seed.employee_code))?;
    }
    Ok(())
}

async fn seed_shifts(tx: &mut Transaction<'_, MySql>) -> Result<()> {
    for (name, code, (start_h, start_m), (end_h, end_m), color) in SHIFTS {
        let start = NaiveTime::from_hms_opt(start_h, start_m, 0).context("shift start")?;
        let end = NaiveTime::from_hms_opt(end_h, end_m, 0).context("shift end")?;

        sqlx::query(
            "INSERT IGNORE INTO shifts (name, code, start_time, end_time, duration_hours, color) \
             VALUES (?, ?, ?, ?, 8.0, ?)",
        )
        .bind(name)
        .bind(code)
        .bind(start)
        .bind(end)
        .bind(color)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("inserting shift {code}"))?;
    }
    Ok(())
}

async fn seed_attendance(tx: &mut Transaction<'_, MySql>, today: NaiveDate) -> Result<()> {
    for code in HISTORY_CODES {
        let (employee_id, user_id): (u64, u64) =
            sqlx::query_as("SELECT id, user_id FROM employees WHERE employee_code = ?")
                .bind(code)
                .fetch_one(&mut **tx)
                .await
                .with_context(|| format!("employee {code} missing"))?;

        for (date, check_in, check_out) in history(today) {
            sqlx::query(
                r#"
                INSERT IGNORE INTO attendances
                    (employee_id, user_id, `date`, check_in, check_out, status, hours_worked)
                VALUES (?, ?, ?, ?, ?, 'present', 8.0)
                "#,
            )
            .bind(employee_id)
            .bind(user_id)
            .bind(date)
            .bind(check_in)
            .bind(check_out)
            .execute(&mut **tx)
            .await
            .with_context(|| format!("inserting attendance for {code} on {date}"))?;
        }
    }
    Ok(())
}

pub async fn run(pool: &MySqlPool, today: NaiveDate) -> Result<()> {
    let mut tx = pool.begin().await.context("opening seed transaction")?;

    seed_divisions(&mut tx).await?;
    seed_users(&mut tx, today).await?;
    seed_shifts(&mut tx).await?;
    seed_attendance(&mut tx, today).await?;

    tx.commit().await.context("committing seed data")?;

    info!(
        divisions = DIVISIONS.len(),
        users = USERS.len(),
        shifts = SHIFTS.len(),
        "Sample data loaded"
    );
    warn!("Sample accounts use well-known passwords; do not seed a production database");
    Ok(())
}
