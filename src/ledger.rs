//! Attendance ledger: one row per (employee, date), moved through
//! `no record -> open -> closed` by check-in and check-out punches.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::info;

use crate::error::{AppError, AppResult, Conflict};
use crate::model::{
    attendance::{Attendance, AttendanceEntry, AttendanceStatus},
    employee::Employee,
    user::User,
};
use crate::query::{AttendanceCriteria, AttendanceFilter, AttendanceStats, Pagination, round_to};
use crate::{auth::policy, store::Store};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerRules {
    /// Check-ins strictly after this time of day are late.
    pub late_after: NaiveTime,
    /// Hours beyond this count as overtime.
    pub standard_hours: f64,
}

impl Default for LedgerRules {
    fn default() -> Self {
        Self {
            late_after: NaiveTime::from_hms_opt(8, 15, 0).unwrap_or(NaiveTime::MIN),
            standard_hours: 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceKey {
    pub employee_id: u64,
    pub user_id: u64,
    pub date: NaiveDate,
}

impl AttendanceKey {
    pub fn for_day(employee: &Employee, at: NaiveDateTime) -> Self {
        Self {
            employee_id: employee.id,
            user_id: employee.user_id,
            date: at.date(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punch {
    In(NaiveDateTime),
    Out(NaiveDateTime),
}

/// Ledger columns after a successful punch.
#[derive(Debug, Clone, PartialEq)]
pub struct Punched {
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub status: AttendanceStatus,
    pub hours_worked: f64,
    pub overtime_hours: f64,
}

pub fn classify(at: NaiveTime, rules: &LedgerRules) -> AttendanceStatus {
    if at > rules.late_after {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

/// The state machine. Pure; backends call it while holding the row.
pub fn transition(
    existing: Option<&Attendance>,
    punch: Punch,
    rules: &LedgerRules,
) -> Result<Punched, Conflict> {
    match punch {
        Punch::In(at) => {
            if existing.is_some_and(|row| row.check_in.is_some()) {
                return Err(Conflict::AlreadyCheckedIn);
            }

            Ok(Punched {
                check_in: Some(at),
                check_out: existing.and_then(|row| row.check_out),
                status: classify(at.time(), rules),
                hours_worked: existing.map_or(0.0, |row| row.hours_worked),
                overtime_hours: existing.map_or(0.0, |row| row.overtime_hours),
            })
        }
        Punch::Out(at) => {
            let row = existing.ok_or(Conflict::NotCheckedIn)?;
            let check_in = row.check_in.ok_or(Conflict::NotCheckedIn)?;
            if row.check_out.is_some() {
                return Err(Conflict::AlreadyCheckedOut);
            }

            let hours = ((at - check_in).num_seconds() as f64 / 3600.0).max(0.0);
            let overtime_hours = if hours > rules.standard_hours {
                round_to(hours - rules.standard_hours, 2)
            } else {
                row.overtime_hours
            };

            Ok(Punched {
                check_in: Some(check_in),
                check_out: Some(at),
                status: row.status,
                hours_worked: round_to(hours, 2),
                overtime_hours,
            })
        }
    }
}

async fn own_employee(store: &dyn Store, actor: &User) -> AppResult<Employee> {
    store
        .find_employee_by_user(actor.id)
        .await?
        .ok_or(AppError::NoEmployeeRecord)
}

pub async fn check_in(
    store: &dyn Store,
    actor: &User,
    now: NaiveDateTime,
    rules: &LedgerRules,
) -> AppResult<(Employee, Attendance)> {
    let employee = own_employee(store, actor).await?;
    let record = store
        .punch(&AttendanceKey::for_day(&employee, now), Punch::In(now), rules)
        .await?;

    info!(
        employee_id = employee.id,
        date = %record.date,
        status = %record.status,
        "Checked in"
    );
    Ok((employee, record))
}

pub async fn check_out(
    store: &dyn Store,
    actor: &User,
    now: NaiveDateTime,
    rules: &LedgerRules,
) -> AppResult<Attendance> {
    let employee = own_employee(store, actor).await?;
    let record = store
        .punch(&AttendanceKey::for_day(&employee, now), Punch::Out(now), rules)
        .await?;

    info!(
        employee_id = employee.id,
        date = %record.date,
        hours_worked = record.hours_worked,
        overtime_hours = record.overtime_hours,
        "Checked out"
    );
    Ok(record)
}

#[derive(Debug, Clone)]
pub struct AttendancePage {
    pub entries: Vec<AttendanceEntry>,
    pub stats: AttendanceStats,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

/// Attendance visible to `actor`, narrowed by `filter`.
pub async fn list_attendance(
    store: &dyn Store,
    actor: &User,
    filter: AttendanceFilter,
    page: Pagination,
) -> AppResult<AttendancePage> {
    let criteria = AttendanceCriteria {
        scope: policy::resolve_scope(actor)?,
        filter,
    };
    let (entries, total) = store.list_attendance(&criteria, &page).await?;
    let stats = AttendanceStats::from_entries(&entries);

    Ok(AttendancePage {
        entries,
        stats,
        total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages(total),
    })
}
