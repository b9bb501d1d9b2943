//! Fixtures shared by the unit and handler tests.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::{
    attendance::{Attendance, AttendanceEntry, AttendanceStatus},
    employee::{Employee, EmployeeEntry},
    leave_request::{LeaveRequest, LeaveRequestEntry, RequestStatus, RequestType},
    shift::Shift,
    user::User,
};
use crate::store::memory::{Department, Division, MemoryStore};

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

pub fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    day().and_hms_opt(h, m, s).unwrap()
}

pub fn user(id: u64, role: &str, division_id: Option<u64>) -> User {
    User {
        id,
        username: format!("user{id}"),
        email: format!("user{id}@factory.com"),
        full_name: format!("User {id}"),
        password_hash: String::new(),
        role: role.to_string(),
        division_id,
        department_id: None,
        avatar_url: None,
        phone: None,
        is_active: true,
        created_at: at(0, 0, 0),
    }
}

pub fn employee(id: u64, user_id: u64, division_id: u64, department_id: u64) -> Employee {
    Employee {
        id,
        user_id,
        employee_code: format!("EMP{id:03}"),
        division_id,
        department_id,
        position: "Operator".to_string(),
        hire_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        shift_type: "morning".to_string(),
        employment_type: "permanent".to_string(),
        phone: None,
        address: None,
        emergency_contact: None,
        emergency_phone: None,
        is_active: true,
        created_at: at(0, 0, 0),
    }
}

pub fn attendance_entry(
    id: u64,
    employee_id: u64,
    user_id: u64,
    division_id: u64,
    date: NaiveDate,
) -> AttendanceEntry {
    AttendanceEntry {
        record: Attendance {
            id,
            employee_id,
            user_id,
            date,
            check_in: None,
            check_out: None,
            status: AttendanceStatus::Absent,
            hours_worked: 0.0,
            overtime_hours: 0.0,
            notes: None,
            created_at: at(0, 0, 0),
        },
        employee_code: format!("EMP{employee_id:03}"),
        position: "Operator".to_string(),
        division_id,
        department_id: 1,
        full_name: format!("User {user_id}"),
        avatar_url: None,
    }
}

pub fn employee_entry(
    id: u64,
    user_id: u64,
    division_id: u64,
    department_id: u64,
    code: &str,
    full_name: &str,
    email: &str,
) -> EmployeeEntry {
    let mut employee = employee(id, user_id, division_id, department_id);
    employee.employee_code = code.to_string();

    EmployeeEntry {
        employee,
        username: format!("user{user_id}"),
        full_name: full_name.to_string(),
        email: email.to_string(),
        avatar_url: None,
        role: "employee".to_string(),
        division_name: None,
        division_color: None,
        department_name: None,
    }
}

pub fn request_entry(
    id: u64,
    user_id: u64,
    employee_id: u64,
    division_id: u64,
    request_type: RequestType,
    status: RequestStatus,
) -> LeaveRequestEntry {
    LeaveRequestEntry {
        request: LeaveRequest {
            id,
            user_id,
            employee_id,
            request_type,
            status,
            start_date: day(),
            end_date: None,
            reason: "Personal".to_string(),
            notes: None,
            approved_by: None,
            approved_at: None,
            created_at: at(0, 0, 0),
            updated_at: None,
        },
        division_id,
        full_name: format!("User {user_id}"),
        email: format!("user{user_id}@factory.com"),
        employee_code: format!("EMP{employee_id:03}"),
        position: "Operator".to_string(),
        approver_name: None,
    }
}

pub struct SampleUsers {
    /// No employee record.
    pub admin: User,
    /// Manages division 1.
    pub manager: User,
    /// Employee in division 1.
    pub john: User,
    /// Employee in division 2.
    pub jane: User,
}

fn named(mut user: User, username: &str, full_name: &str) -> User {
    user.username = username.to_string();
    user.email = format!("{username}@factory.com");
    user.full_name = full_name.to_string();
    user
}

/// Two divisions with one department each, four users and three employees.
pub fn sample_store() -> (MemoryStore, SampleUsers) {
    let store = MemoryStore::default();

    for (id, name, code, color) in [
        (1, "Production Division", "PROD", "blue"),
        (2, "Quality Division", "QA", "green"),
    ] {
        store.add_division(Division {
            id,
            name: name.to_string(),
            code: code.to_string(),
            description: None,
            color: color.to_string(),
            is_active: true,
            created_at: at(0, 0, 0),
        });
        store.add_department(Department {
            id,
            name: format!("{name} Line"),
            code: format!("{code}_A"),
            division_id: id,
            description: None,
            is_active: true,
            created_at: at(0, 0, 0),
        });
    }

    store.add_shift(Shift {
        id: 1,
        name: "Morning Shift".to_string(),
        code: "MORN".to_string(),
        start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        duration_hours: 8.0,
        color: "blue".to_string(),
        break_minutes: 60,
        overtime_allowed: true,
        is_active: true,
    });

    let users = SampleUsers {
        admin: named(user(1, "admin", None), "admin", "System Administrator"),
        manager: named(user(2, "manager", Some(1)), "manager.prod", "Production Manager"),
        john: named(user(3, "employee", Some(1)), "john.doe", "John Doe"),
        jane: named(user(4, "employee", Some(2)), "jane.smith", "Jane Smith"),
    };
    for u in [&users.admin, &users.manager, &users.john, &users.jane] {
        store.add_user(u.clone());
    }

    store.add_employee(employee(1, users.manager.id, 1, 1));
    store.add_employee(employee(2, users.john.id, 1, 1));
    store.add_employee(employee(3, users.jane.id, 2, 2));

    (store, users)
}

/// `Authorization` header carrying a fresh access token for `user`.
pub fn bearer(user: &User) -> (&'static str, String) {
    let secret = crate::config::Config::for_tests().jwt_secret;
    let token = crate::auth::jwt::generate_access_token(user, &secret, 900).unwrap();
    ("Authorization", format!("Bearer {token}"))
}

/// Protected routes under `/api`, behind the auth middleware, over `$store`.
macro_rules! api_app {
    ($store:expr) => {{
        let store: std::sync::Arc<dyn crate::store::Store> = $store.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::from(store))
                .app_data(actix_web::web::Data::new(crate::config::Config::for_tests()))
                .app_data(crate::routes::query_config())
                .app_data(crate::routes::json_config())
                .service(
                    actix_web::web::scope("/api")
                        .wrap(actix_web::middleware::from_fn(
                            crate::auth::middleware::auth_middleware,
                        ))
                        .configure(crate::routes::api_routes),
                ),
        )
        .await
    }};
}
pub(crate) use api_app;
