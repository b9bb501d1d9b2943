use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct DivisionSummary {
    pub id: u64,
    pub name: String,
    pub code: String,
    pub color: String,
    pub description: Option<String>,
    pub department_count: i64,
    pub employee_count: i64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
