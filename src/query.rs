//! Scope-aware listing criteria, pagination and attendance statistics.
//!
//! Each criteria type pairs the actor's [`Scope`] with the caller's filters.
//! The scope is always intersected with the filters, never replaced by them.
//! `matches` is the reference predicate; the MySQL backend renders the same
//! rule as a WHERE clause.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::policy::Scope;
use crate::model::{
    attendance::{AttendanceEntry, AttendanceStatus},
    employee::EmployeeEntry,
    leave_request::{LeaveRequestEntry, RequestStatus, RequestType},
};

pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// `page` is at least 1 and `limit` is clamped to `[1, 100]`.
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit as u64)
    }

    /// Slices an already ordered collection.
    #[cfg(test)]
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit as usize)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceFilter {
    /// Inclusive lower bound on the attendance date
    #[param(value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the attendance date
    #[param(value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    pub division_id: Option<u64>,
    pub department_id: Option<u64>,
    pub employee_id: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AttendanceCriteria {
    pub scope: Scope,
    pub filter: AttendanceFilter,
}

impl AttendanceCriteria {
    pub fn matches(&self, entry: &AttendanceEntry) -> bool {
        let record = &entry.record;
        let f = &self.filter;

        self.scope.covers(record.user_id, entry.division_id)
            && f.start_date.is_none_or(|d| record.date >= d)
            && f.end_date.is_none_or(|d| record.date <= d)
            && f.division_id.is_none_or(|id| entry.division_id == id)
            && f.department_id.is_none_or(|id| entry.department_id == id)
            && f.employee_id.is_none_or(|id| record.employee_id == id)
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub request_type: Option<RequestType>,
}

#[derive(Debug, Clone)]
pub struct RequestCriteria {
    pub scope: Scope,
    pub filter: RequestFilter,
}

impl RequestCriteria {
    pub fn matches(&self, entry: &LeaveRequestEntry) -> bool {
        let request = &entry.request;

        self.scope.covers(request.user_id, entry.division_id)
            && self.filter.status.is_none_or(|s| request.status == s)
            && self
                .filter
                .request_type
                .is_none_or(|t| request.request_type == t)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeCriteria {
    pub scope: Option<Scope>,
    pub search: Option<String>,
    pub division_id: Option<u64>,
    pub department_id: Option<u64>,
    pub active: Option<bool>,
}

impl EmployeeCriteria {
    /// Blank search terms are dropped.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, entry: &EmployeeEntry) -> bool {
        let employee = &entry.employee;

        let in_scope = self
            .scope
            .is_none_or(|scope| scope.covers(employee.user_id, employee.division_id));
        let found = self.search_term().is_none_or(|term| {
            [&entry.full_name, &employee.employee_code, &entry.email]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
        });

        in_scope
            && found
            && self.division_id.is_none_or(|id| employee.division_id == id)
            && self.department_id.is_none_or(|id| employee.department_id == id)
            && self.active.is_none_or(|a| employee.is_active == a)
    }
}

/// Maps the `status` query value of the employee listing.
pub fn parse_active(status: Option<&str>) -> Option<bool> {
    match status {
        Some("active") => Some(true),
        Some("inactive") => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct AttendanceStats {
    pub total: u64,
    pub present: u64,
    pub absent: u64,
    pub late: u64,
    pub on_leave: u64,
    pub half_day: u64,
    pub total_hours: f64,
    /// Percentage of present or late rows.
    pub attendance_rate: f64,
}

impl AttendanceStats {
    pub fn from_entries(entries: &[AttendanceEntry]) -> Self {
        let mut stats = AttendanceStats::default();
        let mut hours = 0.0;

        for entry in entries {
            stats.total += 1;
            hours += entry.record.hours_worked;
            match entry.record.status {
                AttendanceStatus::Present => stats.present += 1,
                AttendanceStatus::Absent => stats.absent += 1,
                AttendanceStatus::Late => stats.late += 1,
                AttendanceStatus::OnLeave => stats.on_leave += 1,
                AttendanceStatus::HalfDay => stats.half_day += 1,
            }
        }

        stats.total_hours = round_to(hours, 2);
        stats.attendance_rate = if stats.total == 0 {
            0.0
        } else {
            round_to(
                (stats.present + stats.late) as f64 / stats.total as f64 * 100.0,
                1,
            )
        };

        stats
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
