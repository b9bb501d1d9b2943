//! Persistence boundary.
//!
//! Handlers and core operations only see `dyn Store`; `MySqlStore` is the
//! production backend.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AppResult;
use crate::ledger::{AttendanceKey, LedgerRules, Punch};
use crate::model::{
    attendance::{Attendance, AttendanceEntry},
    department::DepartmentSummary,
    division::DivisionSummary,
    employee::{Employee, EmployeeEntry},
    leave_request::{LeaveRequest, LeaveRequestEntry, RequestStatus, RequestType},
    shift::Shift,
    user::User,
};
use crate::query::{AttendanceCriteria, EmployeeCriteria, Pagination, RequestCriteria};

#[cfg(test)]
pub mod memory;
pub mod mysql;

/// A validated request, ready to insert as `pending`.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub user_id: u64,
    pub employee_id: u64,
    pub request_type: RequestType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub reason: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Move a request out of `pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub to: RequestStatus,
    /// Set for approve/reject, `None` for a cancellation.
    pub decided_by: Option<u64>,
    pub at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct DashboardCounts {
    pub total_employees: i64,
    pub total_divisions: i64,
    pub total_departments: i64,
    pub today_present: i64,
    pub today_absent: i64,
    pub today_late: i64,
    pub pending_requests: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> AppResult<()>;

    // ---------- identity ----------
    async fn find_user(&self, id: u64) -> AppResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn touch_last_login(&self, user_id: u64, at: NaiveDateTime) -> AppResult<()>;
    async fn store_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: NaiveDateTime,
    ) -> AppResult<()>;
    /// Returns true when a live token was revoked by this call.
    async fn revoke_refresh_token(&self, jti: &str) -> AppResult<bool>;

    // ---------- directory ----------
    async fn find_employee(&self, id: u64) -> AppResult<Option<Employee>>;
    async fn find_employee_by_user(&self, user_id: u64) -> AppResult<Option<Employee>>;
    async fn find_employee_entry(&self, id: u64) -> AppResult<Option<EmployeeEntry>>;
    async fn list_employees(
        &self,
        criteria: &EmployeeCriteria,
        page: &Pagination,
    ) -> AppResult<(Vec<EmployeeEntry>, u64)>;
    /// Active divisions, optionally only the given one.
    async fn list_divisions(&self, only: Option<u64>) -> AppResult<Vec<DivisionSummary>>;
    async fn list_departments(&self, division_id: Option<u64>)
    -> AppResult<Vec<DepartmentSummary>>;
    async fn list_shifts(&self) -> AppResult<Vec<Shift>>;
    async fn dashboard_counts(&self, today: NaiveDate) -> AppResult<DashboardCounts>;

    // ---------- attendance ledger ----------
    /// Applies a punch to the (employee, date) row atomically.
    ///
    /// Backends run [`crate::ledger::transition`] against the current row
    /// while holding it exclusively, and persist nothing when it fails.
    async fn punch(
        &self,
        key: &AttendanceKey,
        punch: Punch,
        rules: &LedgerRules,
    ) -> AppResult<Attendance>;
    /// Ordered by date then id, newest first. Returns the page and the total.
    async fn list_attendance(
        &self,
        criteria: &AttendanceCriteria,
        page: &Pagination,
    ) -> AppResult<(Vec<AttendanceEntry>, u64)>;

    // ---------- leave requests ----------
    async fn insert_request(&self, request: &NewLeaveRequest) -> AppResult<LeaveRequest>;
    async fn find_request(&self, id: u64) -> AppResult<Option<LeaveRequestEntry>>;
    /// Compare-and-set from `pending`; false when the row was no longer pending.
    async fn update_request_status(&self, id: u64, change: &StatusChange) -> AppResult<bool>;
    /// Ordered by creation time, newest first.
    async fn list_requests(&self, criteria: &RequestCriteria) -> AppResult<Vec<LeaveRequestEntry>>;
}
