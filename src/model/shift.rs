use chrono::NaiveTime;
use serde::{Serialize, Serializer};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Shift {
    pub id: u64,
    #[schema(example = "Morning Shift")]
    pub name: String,
    #[schema(example = "MORN")]
    pub code: String,
    #[serde(serialize_with = "hh_mm")]
    #[schema(example = "08:00", value_type = String)]
    pub start_time: NaiveTime,
    #[serde(serialize_with = "hh_mm")]
    #[schema(example = "16:00", value_type = String)]
    pub end_time: NaiveTime,
    #[schema(example = 8.0)]
    pub duration_hours: f64,
    pub color: String,
    /// Minutes.
    #[schema(example = 60)]
    pub break_minutes: u32,
    pub overtime_allowed: bool,
    pub is_active: bool,
}

fn hh_mm<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format("%H:%M"))
}
