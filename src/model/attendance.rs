use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Absent,
    Present,
    Late,
    OnLeave,
    HalfDay,
}

/// One row per employee per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    pub user_id: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "2026-01-05T08:02:11", value_type = String, format = "date-time", nullable = true)]
    pub check_in: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub check_out: Option<NaiveDateTime>,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    #[schema(example = 8.5)]
    pub hours_worked: f64,
    #[schema(example = 0.5)]
    pub overtime_hours: f64,
    pub notes: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

/// Attendance row joined with the employee fields shown in listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceEntry {
    #[sqlx(flatten)]
    pub record: Attendance,
    pub employee_code: String,
    pub position: String,
    pub division_id: u64,
    pub department_id: u64,
    pub full_name: String,
    pub avatar_url: Option<String>,
}
