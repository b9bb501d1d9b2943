use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;
use tracing::debug;

use super::{DashboardCounts, NewLeaveRequest, StatusChange, Store};
use crate::auth::policy::Scope;
use crate::error::{AppResult, Conflict};
use crate::ledger::{self, AttendanceKey, LedgerRules, Punch};
use crate::model::{
    attendance::{Attendance, AttendanceEntry},
    department::DepartmentSummary,
    division::DivisionSummary,
    employee::{Employee, EmployeeEntry},
    leave_request::{LeaveRequest, LeaveRequestEntry, RequestStatus},
    shift::Shift,
    user::User,
};
use crate::query::{AttendanceCriteria, EmployeeCriteria, Pagination, RequestCriteria};
use crate::utils::db_utils::{SqlValue, WhereClause, bind_as, bind_scalar, like_pattern};

const USER_COLUMNS: &str = "id, username, email, full_name, password_hash, role, division_id, \
     department_id, avatar_url, phone, is_active, created_at";

const EMPLOYEE_COLUMNS: &str = "e.id, e.user_id, e.employee_code, e.division_id, e.department_id, \
     e.position, e.hire_date, e.shift_type, e.employment_type, e.phone, e.address, \
     e.emergency_contact, e.emergency_phone, e.is_active, e.created_at";

const EMPLOYEE_ENTRY_FROM: &str = "FROM employees e \
     JOIN users u ON u.id = e.user_id \
     LEFT JOIN divisions d ON d.id = e.division_id \
     LEFT JOIN departments dp ON dp.id = e.department_id";

const ATTENDANCE_COLUMNS: &str = "a.id, a.employee_id, a.user_id, a.`date`, a.check_in, \
     a.check_out, a.status, a.hours_worked, a.overtime_hours, a.notes, a.created_at";

const ATTENDANCE_ENTRY_FROM: &str = "FROM attendances a \
     JOIN employees e ON e.id = a.employee_id \
     JOIN users u ON u.id = e.user_id";

const REQUEST_COLUMNS: &str = "r.id, r.user_id, r.employee_id, r.request_type, r.status, \
     r.start_date, r.end_date, r.reason, r.notes, r.approved_by, r.approved_at, r.created_at, \
     r.updated_at";

const REQUEST_ENTRY_FROM: &str = "FROM leave_requests r \
     JOIN users u ON u.id = r.user_id \
     JOIN employees e ON e.id = r.employee_id \
     LEFT JOIN users ap ON ap.id = r.approved_by";

/// Production backend over a shared MySQL pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn employee_entry_sql(filter: &str) -> String {
        format!(
            "SELECT {EMPLOYEE_COLUMNS}, u.username, u.full_name, u.email, u.avatar_url, u.role, \
             d.name AS division_name, d.color AS division_color, dp.name AS department_name \
             {EMPLOYEE_ENTRY_FROM}{filter}"
        )
    }

    fn request_entry_sql(filter: &str) -> String {
        format!(
            "SELECT {REQUEST_COLUMNS}, e.division_id, u.full_name, u.email, e.employee_code, \
             e.position, ap.full_name AS approver_name \
             {REQUEST_ENTRY_FROM}{filter}"
        )
    }
}

/// Renders a scope restriction. `owner` is the column holding the record
/// owner's user id.
fn restrict(clause: &mut WhereClause, scope: Scope, owner: &str) {
    match scope {
        Scope::All => {}
        Scope::Division(id) => {
            clause.and("e.division_id = ?", id);
        }
        Scope::SelfOnly(user_id) => {
            clause.and(&format!("{owner} = ?"), user_id);
        }
    }
}

fn attendance_where(criteria: &AttendanceCriteria) -> WhereClause {
    let mut clause = WhereClause::new();
    restrict(&mut clause, criteria.scope, "a.user_id");

    let f = &criteria.filter;
    if let Some(start) = f.start_date {
        clause.and("a.`date` >= ?", start);
    }
    if let Some(end) = f.end_date {
        clause.and("a.`date` <= ?", end);
    }
    if let Some(id) = f.division_id {
        clause.and("e.division_id = ?", id);
    }
    if let Some(id) = f.department_id {
        clause.and("e.department_id = ?", id);
    }
    if let Some(id) = f.employee_id {
        clause.and("a.employee_id = ?", id);
    }
    clause
}

fn request_where(criteria: &RequestCriteria) -> WhereClause {
    let mut clause = WhereClause::new();
    restrict(&mut clause, criteria.scope, "r.user_id");

    if let Some(status) = criteria.filter.status {
        clause.and("r.status = ?", status.to_string());
    }
    if let Some(request_type) = criteria.filter.request_type {
        clause.and("r.request_type = ?", request_type.to_string());
    }
    clause
}

fn employee_where(criteria: &EmployeeCriteria) -> WhereClause {
    let mut clause = WhereClause::new();
    if let Some(scope) = criteria.scope {
        restrict(&mut clause, scope, "e.user_id");
    }

    if let Some(term) = criteria.search_term() {
        let pattern = SqlValue::from(like_pattern(&term));
        clause.and_all(
            "(LOWER(u.full_name) LIKE ? OR LOWER(e.employee_code) LIKE ? OR LOWER(u.email) LIKE ?)",
            vec![pattern.clone(), pattern.clone(), pattern],
        );
    }
    if let Some(id) = criteria.division_id {
        clause.and("e.division_id = ?", id);
    }
    if let Some(id) = criteria.department_id {
        clause.and("e.department_id = ?", id);
    }
    if let Some(active) = criteria.active {
        clause.and("e.is_active = ?", active);
    }
    clause
}

/// A concurrent first check-in either hits the (employee_id, date) unique key
/// or is chosen as the deadlock victim on the gap lock.
fn lost_insert_race(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation()
                || matches!(db_err.code().as_deref(), Some("23000") | Some("40001"))
        }
        _ => false,
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user(&self, id: u64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn touch_last_login(&self, user_id: u64, at: NaiveDateTime) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn store_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: NaiveDateTime,
    ) -> AppResult<()> {
        sqlx::query("INSERT INTO refresh_tokens (user_id, jti, expires_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(jti)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ? AND revoked = FALSE")
                .bind(jti)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_employee(&self, id: u64) -> AppResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees e WHERE e.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn find_employee_by_user(&self, user_id: u64) -> AppResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees e WHERE e.user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn find_employee_entry(&self, id: u64) -> AppResult<Option<EmployeeEntry>> {
        let entry = sqlx::query_as::<_, EmployeeEntry>(&Self::employee_entry_sql(
            " WHERE e.id = ?",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn list_employees(
        &self,
        criteria: &EmployeeCriteria,
        page: &Pagination,
    ) -> AppResult<(Vec<EmployeeEntry>, u64)> {
        let clause = employee_where(criteria);
        let filter = clause.sql();

        let count_sql = format!("SELECT COUNT(*) {EMPLOYEE_ENTRY_FROM}{filter}");
        let total: i64 = bind_scalar(sqlx::query_scalar(&count_sql), clause.values())
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            "{} ORDER BY e.id LIMIT ? OFFSET ?",
            Self::employee_entry_sql(&filter)
        );
        let entries = bind_as(sqlx::query_as::<_, EmployeeEntry>(&list_sql), clause.values())
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((entries, total.max(0) as u64))
    }

    async fn list_divisions(&self, only: Option<u64>) -> AppResult<Vec<DivisionSummary>> {
        let mut clause = WhereClause::new();
        clause.and("d.is_active = ?", true);
        if let Some(id) = only {
            clause.and("d.id = ?", id);
        }

        let sql = format!(
            "SELECT d.id, d.name, d.code, d.color, d.description, \
             (SELECT COUNT(*) FROM departments dp \
              WHERE dp.division_id = d.id AND dp.is_active = TRUE) AS department_count, \
             (SELECT COUNT(*) FROM employees e \
              WHERE e.division_id = d.id AND e.is_active = TRUE) AS employee_count, \
             d.created_at \
             FROM divisions d{} ORDER BY d.id",
            clause.sql()
        );
        let divisions = bind_as(sqlx::query_as::<_, DivisionSummary>(&sql), clause.values())
            .fetch_all(&self.pool)
            .await?;
        Ok(divisions)
    }

    async fn list_departments(
        &self,
        division_id: Option<u64>,
    ) -> AppResult<Vec<DepartmentSummary>> {
        let mut clause = WhereClause::new();
        clause.and("dp.is_active = ?", true);
        if let Some(id) = division_id {
            clause.and("dp.division_id = ?", id);
        }

        let sql = format!(
            "SELECT dp.id, dp.name, dp.code, dp.division_id, d.name AS division_name, \
             dp.description, \
             (SELECT COUNT(*) FROM employees e \
              WHERE e.department_id = dp.id AND e.is_active = TRUE) AS employee_count, \
             dp.created_at \
             FROM departments dp LEFT JOIN divisions d ON d.id = dp.division_id{} \
             ORDER BY dp.id",
            clause.sql()
        );
        let departments = bind_as(sqlx::query_as::<_, DepartmentSummary>(&sql), clause.values())
            .fetch_all(&self.pool)
            .await?;
        Ok(departments)
    }

    async fn list_shifts(&self) -> AppResult<Vec<Shift>> {
        let shifts = sqlx::query_as::<_, Shift>(
            r#"
            SELECT id, name, code, start_time, end_time, duration_hours, color,
                   break_minutes, overtime_allowed, is_active
            FROM shifts
            WHERE is_active = TRUE
            ORDER BY start_time
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(shifts)
    }

    async fn dashboard_counts(&self, today: NaiveDate) -> AppResult<DashboardCounts> {
        let counts = sqlx::query_as::<_, DashboardCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM employees WHERE is_active = TRUE) AS total_employees,
                (SELECT COUNT(*) FROM divisions WHERE is_active = TRUE) AS total_divisions,
                (SELECT COUNT(*) FROM departments WHERE is_active = TRUE) AS total_departments,
                (SELECT COUNT(*) FROM attendances WHERE `date` = ? AND status = 'present') AS today_present,
                (SELECT COUNT(*) FROM attendances WHERE `date` = ? AND status = 'absent') AS today_absent,
                (SELECT COUNT(*) FROM attendances WHERE `date` = ? AND status = 'late') AS today_late,
                (SELECT COUNT(*) FROM leave_requests WHERE status = 'pending') AS pending_requests
            "#,
        )
        .bind(today)
        .bind(today)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn punch(
        &self,
        key: &AttendanceKey,
        punch: Punch,
        rules: &LedgerRules,
    ) -> AppResult<Attendance> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendances a \
             WHERE a.employee_id = ? AND a.`date` = ? FOR UPDATE"
        ))
        .bind(key.employee_id)
        .bind(key.date)
        .fetch_optional(&mut *tx)
        .await?;

        // returning early drops `tx`, which rolls back
        let punched = ledger::transition(existing.as_ref(), punch, rules)?;

        let id = match existing {
            Some(row) => {
                sqlx::query(
                    r#"
                    UPDATE attendances
                    SET check_in = ?, check_out = ?, status = ?, hours_worked = ?, overtime_hours = ?
                    WHERE id = ?
                    "#,
                )
                .bind(punched.check_in)
                .bind(punched.check_out)
                .bind(punched.status.to_string())
                .bind(punched.hours_worked)
                .bind(punched.overtime_hours)
                .bind(row.id)
                .execute(&mut *tx)
                .await?;
                row.id
            }
            None => {
                let (Punch::In(created_at) | Punch::Out(created_at)) = punch;
                let inserted = sqlx::query(
                    r#"
                    INSERT INTO attendances
                        (employee_id, user_id, `date`, check_in, check_out, status,
                         hours_worked, overtime_hours, created_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(key.employee_id)
                .bind(key.user_id)
                .bind(key.date)
                .bind(punched.check_in)
                .bind(punched.check_out)
                .bind(punched.status.to_string())
                .bind(punched.hours_worked)
                .bind(punched.overtime_hours)
                .bind(created_at)
                .execute(&mut *tx)
                .await;

                match inserted {
                    Ok(result) => result.last_insert_id(),
                    Err(e) if lost_insert_race(&e) => {
                        debug!(
                            employee_id = key.employee_id,
                            date = %key.date,
                            "Concurrent check-in lost the insert race"
                        );
                        return Err(Conflict::AlreadyCheckedIn.into());
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let record = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendances a WHERE a.id = ?"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn list_attendance(
        &self,
        criteria: &AttendanceCriteria,
        page: &Pagination,
    ) -> AppResult<(Vec<AttendanceEntry>, u64)> {
        let clause = attendance_where(criteria);
        let filter = clause.sql();

        let count_sql = format!("SELECT COUNT(*) {ATTENDANCE_ENTRY_FROM}{filter}");
        let total: i64 = bind_scalar(sqlx::query_scalar(&count_sql), clause.values())
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            "SELECT {ATTENDANCE_COLUMNS}, e.employee_code, e.position, e.division_id, \
             e.department_id, u.full_name, u.avatar_url \
             {ATTENDANCE_ENTRY_FROM}{filter} \
             ORDER BY a.`date` DESC, a.id DESC LIMIT ? OFFSET ?"
        );
        let entries = bind_as(sqlx::query_as::<_, AttendanceEntry>(&list_sql), clause.values())
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((entries, total.max(0) as u64))
    }

    async fn insert_request(&self, request: &NewLeaveRequest) -> AppResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (user_id, employee_id, request_type, status, start_date, end_date,
                 reason, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.user_id)
        .bind(request.employee_id)
        .bind(request.request_type.to_string())
        .bind(RequestStatus::Pending.to_string())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.reason)
        .bind(&request.notes)
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests r WHERE r.id = ?"
        ))
        .bind(result.last_insert_id())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_request(&self, id: u64) -> AppResult<Option<LeaveRequestEntry>> {
        let entry = sqlx::query_as::<_, LeaveRequestEntry>(&Self::request_entry_sql(
            " WHERE r.id = ?",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn update_request_status(&self, id: u64, change: &StatusChange) -> AppResult<bool> {
        // approved_* only move on a decision; a cancellation leaves them NULL
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?,
                approved_by = COALESCE(?, approved_by),
                approved_at = IF(? IS NULL, approved_at, ?),
                updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(change.to.to_string())
        .bind(change.decided_by)
        .bind(change.decided_by)
        .bind(change.at)
        .bind(change.at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_requests(&self, criteria: &RequestCriteria) -> AppResult<Vec<LeaveRequestEntry>> {
        let clause = request_where(criteria);
        let sql = format!(
            "{} ORDER BY r.created_at DESC, r.id DESC",
            Self::request_entry_sql(&clause.sql())
        );

        let entries = bind_as(sqlx::query_as::<_, LeaveRequestEntry>(&sql), clause.values())
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }
}
