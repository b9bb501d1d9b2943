use crate::api::attendance::{
    AttendanceItem, AttendanceListResponse, CheckInResponse, CheckOutResponse, EmployeeBrief,
};
use crate::api::employee::{
    DepartmentRef, DivisionRef, EmployeeListResponse, EmployeeResponse, EmployeeUser,
};
use crate::api::health::HealthResponse;
use crate::api::leave_request::{
    ApproverBrief, RequestActionResponse, RequestEmployeeBrief, RequestItem, RequesterBrief,
    SubmitResponse,
};
use crate::auth::handlers::LoginResponse;
use crate::directory::{DashboardStats, DivisionStat};
use crate::model::{
    attendance::{Attendance, AttendanceStatus},
    department::DepartmentSummary,
    division::DivisionSummary,
    employee::Employee,
    leave_request::{LeaveRequest, RequestStatus, RequestType},
    shift::Shift,
    user::User,
};
use crate::models::{LoginReqDto, RefreshReqDto, TokenPair};
use crate::query::AttendanceStats;
use crate::workflow::SubmitRequest;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Factory HRM API",
        version = "1.0.0",
        description = r#"
## Factory attendance and leave backend

Daily punch-in/punch-out, leave / shift-change / overtime requests with
manager approval, and a read-only organisation directory.

### Roles
- **admin**: sees and decides everything
- **manager**: scoped to their own division
- **employee**: own attendance and own requests only

### Security
Everything under `/api` requires a **JWT Bearer** access token from
`/auth/login`. Refresh tokens rotate through `/auth/refresh`.

### Errors
Failures answer `{"error": <kind>, "message": <text>}`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_attendance,

        crate::api::leave_request::list_requests,
        crate::api::leave_request::get_request,
        crate::api::leave_request::create_request,
        crate::api::leave_request::approve_request,
        crate::api::leave_request::reject_request,
        crate::api::leave_request::cancel_request,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,

        crate::api::directory::list_divisions,
        crate::api::directory::list_departments,
        crate::api::directory::list_shifts,

        crate::api::dashboard::dashboard_stats,
        crate::api::health::health
    ),
    components(
        schemas(
            LoginReqDto,
            RefreshReqDto,
            TokenPair,
            LoginResponse,
            User,
            Attendance,
            AttendanceStatus,
            AttendanceStats,
            AttendanceItem,
            AttendanceListResponse,
            EmployeeBrief,
            CheckInResponse,
            CheckOutResponse,
            LeaveRequest,
            RequestStatus,
            RequestType,
            SubmitRequest,
            SubmitResponse,
            RequestItem,
            RequesterBrief,
            RequestEmployeeBrief,
            ApproverBrief,
            RequestActionResponse,
            Employee,
            EmployeeUser,
            DivisionRef,
            DepartmentRef,
            EmployeeResponse,
            EmployeeListResponse,
            DivisionSummary,
            DepartmentSummary,
            Shift,
            DashboardStats,
            DivisionStat,
            HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token rotation and the current user"),
        (name = "Attendance", description = "Daily check-in / check-out and attendance history"),
        (name = "Requests", description = "Leave, shift-change and overtime requests"),
        (name = "Employee", description = "Employee directory"),
        (name = "Organisation", description = "Divisions, departments and shifts"),
        (name = "Dashboard", description = "Headline counters"),
        (name = "Health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
