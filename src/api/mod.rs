pub mod attendance;
pub mod dashboard;
pub mod directory;
pub mod employee;
pub mod health;
pub mod leave_request;

use chrono::{Local, NaiveDateTime, Timelike};

/// Wall-clock time handed to the core operations, truncated to whole seconds.
pub fn local_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
