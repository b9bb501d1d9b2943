use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestType {
    #[default]
    Leave,
    ShiftChange,
    Overtime,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    pub user_id: u64,
    pub employee_id: u64,
    #[sqlx(try_from = "String")]
    pub request_type: RequestType,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    #[schema(example = "2026-02-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-02-03", value_type = String, format = "date", nullable = true)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "Family event")]
    pub reason: String,
    pub notes: Option<String>,
    pub approved_by: Option<u64>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub approved_at: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Request row joined with requester, employee and approver details.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeaveRequestEntry {
    #[sqlx(flatten)]
    pub request: LeaveRequest,
    pub division_id: u64,
    pub full_name: String,
    pub email: String,
    pub employee_code: String,
    pub position: String,
    pub approver_name: Option<String>,
}
