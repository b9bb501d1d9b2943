use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 2,
        "user_id": 2,
        "employee_code": "EMP001",
        "division_id": 1,
        "department_id": 1,
        "position": "Production Operator",
        "hire_date": "2025-01-01",
        "shift_type": "morning",
        "employment_type": "permanent",
        "phone": null,
        "address": null,
        "emergency_contact": null,
        "emergency_phone": null,
        "is_active": true,
        "created_at": "2025-01-01T08:00:00"
    })
)]
pub struct Employee {
    #[schema(example = 2)]
    pub id: u64,

    #[schema(example = 2)]
    pub user_id: u64,

    #[schema(example = "EMP001")]
    pub employee_code: String,

    #[schema(example = 1)]
    pub division_id: u64,

    #[schema(example = 1)]
    pub department_id: u64,

    #[schema(example = "Production Operator")]
    pub position: String,

    #[schema(
        example = "2025-01-01",
        value_type = String,
        format = "date"
    )]
    pub hire_date: NaiveDate,

    #[schema(example = "morning")]
    pub shift_type: String,

    #[schema(example = "permanent")]
    pub employment_type: String,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "12 Mill Road, Gazipur", nullable = true)]
    pub address: Option<String>,

    #[schema(example = "Mary Doe", nullable = true)]
    pub emergency_contact: Option<String>,

    #[schema(example = "+8801812345678", nullable = true)]
    pub emergency_phone: Option<String>,

    pub is_active: bool,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

/// Employee joined with the user, division and department columns the
/// directory shows.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmployeeEntry {
    #[sqlx(flatten)]
    pub employee: Employee,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: String,
    pub division_name: Option<String>,
    pub division_color: Option<String>,
    pub department_name: Option<String>,
}
