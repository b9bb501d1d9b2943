use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

/// Department row as listed, with its division name and head count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct DepartmentSummary {
    pub id: u64,
    pub name: String,
    pub code: String,
    pub division_id: u64,
    pub division_name: Option<String>,
    pub description: Option<String>,
    pub employee_count: i64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
