use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct User {
    #[schema(example = 4)]
    pub id: u64,
    #[schema(example = "manager.prod")]
    pub username: String,
    #[schema(example = "manager.prod@factory.com")]
    pub email: String,
    #[schema(example = "Production Manager")]
    pub full_name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Raw role name; only `auth::policy` interprets it.
    #[schema(example = "manager")]
    pub role: String,
    #[schema(example = 1, nullable = true)]
    pub division_id: Option<u64>,
    #[schema(example = 1, nullable = true)]
    pub department_id: Option<u64>,
    #[schema(nullable = true)]
    pub avatar_url: Option<String>,
    #[schema(nullable = true)]
    pub phone: Option<String>,
    pub is_active: bool,
    #[schema(example = "2026-01-01T08:00:00", format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
}
