//! In-process `Store` used by the test suite.
//!
//! Everything sits behind one mutex, so every trait call is atomic. Listing
//! goes through the same `matches` predicates the SQL backend renders.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use super::{DashboardCounts, NewLeaveRequest, StatusChange, Store};
use crate::error::{AppResult, Conflict};
use crate::ledger::{self, AttendanceKey, LedgerRules, Punch};
use crate::model::{
    attendance::{Attendance, AttendanceEntry, AttendanceStatus},
    department::DepartmentSummary,
    division::DivisionSummary,
    employee::{Employee, EmployeeEntry},
    leave_request::{LeaveRequest, LeaveRequestEntry, RequestStatus},
    shift::Shift,
    user::User,
};
use crate::query::{AttendanceCriteria, EmployeeCriteria, Pagination, RequestCriteria};

/// Organisation rows. The SQL backend only ever reads them as summaries.
#[derive(Debug, Clone)]
pub struct Division {
    pub id: u64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub color: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct Department {
    pub id: u64,
    pub name: String,
    pub code: String,
    pub division_id: u64,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
struct RefreshToken {
    jti: String,
    user_id: u64,
    expires_at: NaiveDateTime,
    revoked: bool,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    employees: Vec<Employee>,
    divisions: Vec<Division>,
    departments: Vec<Department>,
    shifts: Vec<Shift>,
    attendances: Vec<Attendance>,
    requests: Vec<LeaveRequest>,
    refresh_tokens: Vec<RefreshToken>,
    last_login: Vec<(u64, NaiveDateTime)>,
    next_attendance_id: u64,
    next_request_id: u64,
}

impl Tables {
    fn user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn employee(&self, id: u64) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    fn employee_entry(&self, employee: &Employee) -> Option<EmployeeEntry> {
        let user = self.user(employee.user_id)?;
        let division = self.divisions.iter().find(|d| d.id == employee.division_id);
        let department = self
            .departments
            .iter()
            .find(|d| d.id == employee.department_id);

        Some(EmployeeEntry {
            employee: employee.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            role: user.role.clone(),
            division_name: division.map(|d| d.name.clone()),
            division_color: division.map(|d| d.color.clone()),
            department_name: department.map(|d| d.name.clone()),
        })
    }

    fn attendance_entry(&self, record: &Attendance) -> Option<AttendanceEntry> {
        let employee = self.employee(record.employee_id)?;
        let user = self.user(employee.user_id)?;

        Some(AttendanceEntry {
            record: record.clone(),
            employee_code: employee.employee_code.clone(),
            position: employee.position.clone(),
            division_id: employee.division_id,
            department_id: employee.department_id,
            full_name: user.full_name.clone(),
            avatar_url: user.avatar_url.clone(),
        })
    }

    fn request_entry(&self, request: &LeaveRequest) -> Option<LeaveRequestEntry> {
        let employee = self.employee(request.employee_id)?;
        let user = self.user(request.user_id)?;
        let approver = request.approved_by.and_then(|id| self.user(id));

        Some(LeaveRequestEntry {
            request: request.clone(),
            division_id: employee.division_id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            employee_code: employee.employee_code.clone(),
            position: employee.position.clone(),
            approver_name: approver.map(|u| u.full_name.clone()),
        })
    }

    fn active_employees_in(&self, division_id: u64) -> i64 {
        self.employees
            .iter()
            .filter(|e| e.is_active && e.division_id == division_id)
            .count() as i64
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        // a panicking test must not poison the others
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_user(&self, user: User) {
        self.lock().users.push(user);
    }

    pub fn add_employee(&self, employee: Employee) {
        self.lock().employees.push(employee);
    }

    pub fn add_division(&self, division: Division) {
        self.lock().divisions.push(division);
    }

    pub fn add_department(&self, department: Department) {
        self.lock().departments.push(department);
    }

    pub fn add_shift(&self, shift: Shift) {
        self.lock().shifts.push(shift);
    }

    pub fn set_user_role(&self, user_id: u64, role: &str) {
        if let Some(user) = self.lock().users.iter_mut().find(|u| u.id == user_id) {
            user.role = role.to_string();
        }
    }

    pub fn employee_of(&self, user_id: u64) -> Employee {
        self.lock()
            .employees
            .iter()
            .find(|e| e.user_id == user_id)
            .cloned()
            .unwrap_or_else(|| panic!("no employee for user {user_id}"))
    }

    /// Inserts a row without punch times, the way a scheduler pre-seeds days.
    pub fn seed_attendance(
        &self,
        employee: &Employee,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Attendance {
        let mut tables = self.lock();
        tables.next_attendance_id += 1;
        let record = Attendance {
            id: tables.next_attendance_id,
            employee_id: employee.id,
            user_id: employee.user_id,
            date,
            check_in: None,
            check_out: None,
            status,
            hours_worked: 0.0,
            overtime_hours: 0.0,
            notes: None,
            created_at: date.and_time(chrono::NaiveTime::MIN),
        };
        tables.attendances.push(record.clone());
        record
    }

    pub fn attendance_row(&self, id: u64) -> Option<Attendance> {
        self.lock().attendances.iter().find(|a| a.id == id).cloned()
    }

    pub fn attendance_count(&self) -> usize {
        self.lock().attendances.len()
    }

    pub fn last_login(&self, user_id: u64) -> Option<NaiveDateTime> {
        self.lock()
            .last_login
            .iter()
            .find(|(id, _)| *id == user_id)
            .map(|(_, at)| *at)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn find_user(&self, id: u64) -> AppResult<Option<User>> {
        Ok(self.lock().user(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn touch_last_login(&self, user_id: u64, at: NaiveDateTime) -> AppResult<()> {
        let mut tables = self.lock();
        tables.last_login.retain(|(id, _)| *id != user_id);
        tables.last_login.push((user_id, at));
        Ok(())
    }

    async fn store_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: NaiveDateTime,
    ) -> AppResult<()> {
        self.lock().refresh_tokens.push(RefreshToken {
            jti: jti.to_string(),
            user_id,
            expires_at,
            revoked: false,
        });
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> AppResult<bool> {
        let mut tables = self.lock();
        let token = tables
            .refresh_tokens
            .iter_mut()
            .find(|t| t.jti == jti && !t.revoked);

        Ok(match token {
            Some(token) => {
                token.revoked = true;
                tracing::debug!(
                    user_id = token.user_id,
                    expires_at = %token.expires_at,
                    "Refresh token revoked"
                );
                true
            }
            None => false,
        })
    }

    async fn find_employee(&self, id: u64) -> AppResult<Option<Employee>> {
        Ok(self.lock().employee(id).cloned())
    }

    async fn find_employee_by_user(&self, user_id: u64) -> AppResult<Option<Employee>> {
        Ok(self
            .lock()
            .employees
            .iter()
            .find(|e| e.user_id == user_id)
            .cloned())
    }

    async fn find_employee_entry(&self, id: u64) -> AppResult<Option<EmployeeEntry>> {
        let tables = self.lock();
        Ok(tables
            .employee(id)
            .and_then(|employee| tables.employee_entry(employee)))
    }

    async fn list_employees(
        &self,
        criteria: &EmployeeCriteria,
        page: &Pagination,
    ) -> AppResult<(Vec<EmployeeEntry>, u64)> {
        let tables = self.lock();
        let mut entries: Vec<EmployeeEntry> = tables
            .employees
            .iter()
            .filter_map(|e| tables.employee_entry(e))
            .filter(|entry| criteria.matches(entry))
            .collect();
        entries.sort_by_key(|entry| entry.employee.id);

        let total = entries.len() as u64;
        Ok((page.apply(entries), total))
    }

    async fn list_divisions(&self, only: Option<u64>) -> AppResult<Vec<DivisionSummary>> {
        let tables = self.lock();
        let mut divisions: Vec<DivisionSummary> = tables
            .divisions
            .iter()
            .filter(|d| d.is_active && only.is_none_or(|id| d.id == id))
            .map(|d| DivisionSummary {
                id: d.id,
                name: d.name.clone(),
                code: d.code.clone(),
                color: d.color.clone(),
                description: d.description.clone(),
                department_count: tables
                    .departments
                    .iter()
                    .filter(|dep| dep.is_active && dep.division_id == d.id)
                    .count() as i64,
                employee_count: tables.active_employees_in(d.id),
                created_at: d.created_at,
            })
            .collect();
        divisions.sort_by_key(|d| d.id);
        Ok(divisions)
    }

    async fn list_departments(
        &self,
        division_id: Option<u64>,
    ) -> AppResult<Vec<DepartmentSummary>> {
        let tables = self.lock();
        let mut departments: Vec<DepartmentSummary> = tables
            .departments
            .iter()
            .filter(|d| d.is_active && division_id.is_none_or(|id| d.division_id == id))
            .map(|d| DepartmentSummary {
                id: d.id,
                name: d.name.clone(),
                code: d.code.clone(),
                division_id: d.division_id,
                division_name: tables
                    .divisions
                    .iter()
                    .find(|div| div.id == d.division_id)
                    .map(|div| div.name.clone()),
                description: d.description.clone(),
                employee_count: tables
                    .employees
                    .iter()
                    .filter(|e| e.is_active && e.department_id == d.id)
                    .count() as i64,
                created_at: d.created_at,
            })
            .collect();
        departments.sort_by_key(|d| d.id);
        Ok(departments)
    }

    async fn list_shifts(&self) -> AppResult<Vec<Shift>> {
        let tables = self.lock();
        let mut shifts: Vec<Shift> = tables.shifts.iter().filter(|s| s.is_active).cloned().collect();
        shifts.sort_by_key(|s| s.start_time);
        Ok(shifts)
    }

    async fn dashboard_counts(&self, today: NaiveDate) -> AppResult<DashboardCounts> {
        let tables = self.lock();
        let today_with = |status: AttendanceStatus| {
            tables
                .attendances
                .iter()
                .filter(|a| a.date == today && a.status == status)
                .count() as i64
        };

        Ok(DashboardCounts {
            total_employees: tables.employees.iter().filter(|e| e.is_active).count() as i64,
            total_divisions: tables.divisions.iter().filter(|d| d.is_active).count() as i64,
            total_departments: tables.departments.iter().filter(|d| d.is_active).count() as i64,
            today_present: today_with(AttendanceStatus::Present),
            today_absent: today_with(AttendanceStatus::Absent),
            today_late: today_with(AttendanceStatus::Late),
            pending_requests: tables
                .requests
                .iter()
                .filter(|r| r.status == RequestStatus::Pending)
                .count() as i64,
        })
    }

    async fn punch(
        &self,
        key: &AttendanceKey,
        punch: Punch,
        rules: &LedgerRules,
    ) -> AppResult<Attendance> {
        let mut tables = self.lock();
        let position = tables
            .attendances
            .iter()
            .position(|a| a.employee_id == key.employee_id && a.date == key.date);

        let punched = ledger::transition(position.map(|i| &tables.attendances[i]), punch, rules)?;

        let record = match position {
            Some(i) => {
                let row = &mut tables.attendances[i];
                row.check_in = punched.check_in;
                row.check_out = punched.check_out;
                row.status = punched.status;
                row.hours_worked = punched.hours_worked;
                row.overtime_hours = punched.overtime_hours;
                row.clone()
            }
            None => {
                let Punch::In(created_at) = punch else {
                    return Err(Conflict::NotCheckedIn.into());
                };
                tables.next_attendance_id += 1;
                let row = Attendance {
                    id: tables.next_attendance_id,
                    employee_id: key.employee_id,
                    user_id: key.user_id,
                    date: key.date,
                    check_in: punched.check_in,
                    check_out: punched.check_out,
                    status: punched.status,
                    hours_worked: punched.hours_worked,
                    overtime_hours: punched.overtime_hours,
                    notes: None,
                    created_at,
                };
                tables.attendances.push(row.clone());
                row
            }
        };

        Ok(record)
    }

    async fn list_attendance(
        &self,
        criteria: &AttendanceCriteria,
        page: &Pagination,
    ) -> AppResult<(Vec<AttendanceEntry>, u64)> {
        let tables = self.lock();
        let mut entries: Vec<AttendanceEntry> = tables
            .attendances
            .iter()
            .filter_map(|a| tables.attendance_entry(a))
            .filter(|entry| criteria.matches(entry))
            .collect();
        entries.sort_by(|a, b| {
            (b.record.date, b.record.id).cmp(&(a.record.date, a.record.id))
        });

        let total = entries.len() as u64;
        Ok((page.apply(entries), total))
    }

    async fn insert_request(&self, request: &NewLeaveRequest) -> AppResult<LeaveRequest> {
        let mut tables = self.lock();
        tables.next_request_id += 1;
        let row = LeaveRequest {
            id: tables.next_request_id,
            user_id: request.user_id,
            employee_id: request.employee_id,
            request_type: request.request_type,
            status: RequestStatus::Pending,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason.clone(),
            notes: request.notes.clone(),
            approved_by: None,
            approved_at: None,
            created_at: request.created_at,
            updated_at: None,
        };
        tables.requests.push(row.clone());
        Ok(row)
    }

    async fn find_request(&self, id: u64) -> AppResult<Option<LeaveRequestEntry>> {
        let tables = self.lock();
        Ok(tables
            .requests
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| tables.request_entry(r)))
    }

    async fn update_request_status(&self, id: u64, change: &StatusChange) -> AppResult<bool> {
        let mut tables = self.lock();
        let Some(row) = tables
            .requests
            .iter_mut()
            .find(|r| r.id == id && r.status == RequestStatus::Pending)
        else {
            return Ok(false);
        };

        row.status = change.to;
        if let Some(decided_by) = change.decided_by {
            row.approved_by = Some(decided_by);
            row.approved_at = Some(change.at);
        }
        row.updated_at = Some(change.at);
        Ok(true)
    }

    async fn list_requests(&self, criteria: &RequestCriteria) -> AppResult<Vec<LeaveRequestEntry>> {
        let tables = self.lock();
        let mut entries: Vec<LeaveRequestEntry> = tables
            .requests
            .iter()
            .filter_map(|r| tables.request_entry(r))
            .filter(|entry| criteria.matches(entry))
            .collect();
        entries.sort_by(|a, b| {
            (b.request.created_at, b.request.id).cmp(&(a.request.created_at, a.request.id))
        });
        Ok(entries)
    }
}
