use crate::api::local_now;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppResult;
use crate::ledger::{self, DEFAULT_PAGE_SIZE};
use crate::model::attendance::{Attendance, AttendanceEntry, AttendanceStatus};
use crate::query::{AttendanceFilter, AttendanceStats, Pagination};
use crate::store::Store;
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    /// Inclusive lower bound, `YYYY-MM-DD`
    #[param(value_type = Option<String>, example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    #[param(value_type = Option<String>, example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
    pub division_id: Option<u64>,
    pub department_id: Option<u64>,
    pub employee_id: Option<u64>,
    /// Pagination page number (start with 1)
    #[param(example = 1)]
    pub page: Option<u32>,
    /// Items per page, at most 100
    #[param(example = 100)]
    pub limit: Option<u32>,
}

impl AttendanceQuery {
    fn split(self) -> (AttendanceFilter, Pagination) {
        (
            AttendanceFilter {
                start_date: self.start_date,
                end_date: self.end_date,
                division_id: self.division_id,
                department_id: self.department_id,
                employee_id: self.employee_id,
            },
            Pagination::new(self.page, self.limit, DEFAULT_PAGE_SIZE),
        )
    }
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeBrief {
    #[schema(example = 2)]
    pub id: u64,
    #[schema(example = "EMP002")]
    pub employee_code: String,
    #[schema(example = "Production Operator")]
    pub position: String,
    #[schema(example = "John Doe")]
    pub full_name: String,
    #[schema(nullable = true)]
    pub avatar_url: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceItem {
    #[serde(flatten)]
    pub record: Attendance,
    pub employee: EmployeeBrief,
}

impl From<AttendanceEntry> for AttendanceItem {
    fn from(entry: AttendanceEntry) -> Self {
        Self {
            employee: EmployeeBrief {
                id: entry.record.employee_id,
                employee_code: entry.employee_code,
                position: entry.position,
                full_name: entry.full_name,
                avatar_url: entry.avatar_url,
            },
            record: entry.record,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub attendances: Vec<AttendanceItem>,
    /// Computed over the returned page
    pub page_stats: AttendanceStats,
    #[schema(example = 42)]
    pub total: u64,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 100)]
    pub limit: u32,
    #[schema(example = 1)]
    pub total_pages: u64,
}

#[derive(Serialize, ToSchema)]
pub struct CheckInResponse {
    #[schema(example = "Checked in successfully")]
    pub message: String,
    pub status: AttendanceStatus,
    #[schema(example = "08:02")]
    pub time: String,
    #[schema(example = "EMP002")]
    pub employee: String,
}

#[derive(Serialize, ToSchema)]
pub struct CheckOutResponse {
    #[schema(example = "Checked out successfully")]
    pub message: String,
    #[schema(example = 9.0)]
    pub hours_worked: f64,
    #[schema(example = 1.0)]
    pub overtime_hours: f64,
    #[schema(example = "17:02")]
    pub time: String,
}

fn clock(at: Option<NaiveDateTime>) -> String {
    at.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 200, description = "Checked in successfully", body = CheckInResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "error": "already_checked_in",
            "message": "Already checked in today"
        })),
        (status = 503, description = "Storage unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let (employee, record) =
        ledger::check_in(store.get_ref(), &auth, local_now(), &config.ledger_rules()).await?;

    Ok(HttpResponse::Ok().json(CheckInResponse {
        message: "Checked in successfully".to_string(),
        status: record.status,
        time: clock(record.check_in),
        employee: employee.employee_code,
    }))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = CheckOutResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 409, description = "Not checked in, or already checked out", body = Object, example = json!({
            "error": "not_checked_in",
            "message": "You haven't checked in today"
        })),
        (status = 503, description = "Storage unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let record =
        ledger::check_out(store.get_ref(), &auth, local_now(), &config.ledger_rules()).await?;

    Ok(HttpResponse::Ok().json(CheckOutResponse {
        message: "Checked out successfully".to_string(),
        hours_worked: record.hours_worked,
        overtime_hours: record.overtime_hours,
        time: clock(record.check_out),
    }))
}

/// Attendance visible to the caller: own rows for employees, the division
/// for managers, everything for admins.
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Attendance page with per-page stats", body = AttendanceListResponse),
        (status = 400, description = "Malformed query"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<AttendanceQuery>,
) -> AppResult<HttpResponse> {
    let (filter, page) = query.into_inner().split();
    let result = ledger::list_attendance(store.get_ref(), &auth, filter, page).await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        attendances: result.entries.into_iter().map(AttendanceItem::from).collect(),
        page_stats: result.stats,
        total: result.total,
        page: result.page,
        limit: result.limit,
        total_pages: result.total_pages,
    }))
}
