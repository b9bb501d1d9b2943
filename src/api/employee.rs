use crate::auth::auth::AuthUser;
use crate::directory::{self, DEFAULT_PAGE_SIZE};
use crate::error::AppResult;
use crate::model::employee::{Employee, EmployeeEntry};
use crate::query::{EmployeeCriteria, Pagination, parse_active};
use crate::store::Store;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Case-insensitive match on name, employee code or email
    #[param(example = "john")]
    pub search: Option<String>,
    pub division_id: Option<u64>,
    pub department_id: Option<u64>,
    /// `active` or `inactive`; anything else is ignored
    #[param(example = "active")]
    pub status: Option<String>,
    #[param(example = 1)]
    pub page: Option<u32>,
    /// Items per page, at most 100
    #[param(example = 20)]
    pub limit: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeUser {
    pub id: u64,
    #[schema(example = "john.doe")]
    pub username: String,
    #[schema(example = "john.doe@factory.com")]
    pub email: String,
    #[schema(example = "John Doe")]
    pub full_name: String,
    #[schema(nullable = true)]
    pub avatar_url: Option<String>,
    #[schema(example = "employee")]
    pub role: String,
}

#[derive(Serialize, ToSchema)]
pub struct DivisionRef {
    pub id: u64,
    #[schema(example = "Production Division")]
    pub name: String,
    #[schema(example = "blue")]
    pub color: String,
}

#[derive(Serialize, ToSchema)]
pub struct DepartmentRef {
    pub id: u64,
    #[schema(example = "Assembly Line A")]
    pub name: String,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeResponse {
    #[serde(flatten)]
    pub employee: Employee,
    pub user: EmployeeUser,
    #[schema(nullable = true)]
    pub division: Option<DivisionRef>,
    #[schema(nullable = true)]
    pub department: Option<DepartmentRef>,
}

impl From<EmployeeEntry> for EmployeeResponse {
    fn from(entry: EmployeeEntry) -> Self {
        let employee = entry.employee;
        let division = entry.division_name.map(|name| DivisionRef {
            id: employee.division_id,
            name,
            color: entry.division_color.unwrap_or_default(),
        });
        let department = entry.department_name.map(|name| DepartmentRef {
            id: employee.department_id,
            name,
        });

        Self {
            user: EmployeeUser {
                id: employee.user_id,
                username: entry.username,
                email: entry.email,
                full_name: entry.full_name,
                avatar_url: entry.avatar_url,
                role: entry.role,
            },
            division,
            department,
            employee,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub employees: Vec<EmployeeResponse>,
    #[schema(example = 120)]
    pub total: u64,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub limit: u32,
    #[schema(example = 6)]
    pub total_pages: u64,
}

/// List employees (admin and manager)
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Employees cannot browse the directory")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<EmployeeQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let criteria = EmployeeCriteria {
        scope: None,
        active: parse_active(query.status.as_deref()),
        search: query.search,
        division_id: query.division_id,
        department_id: query.department_id,
    };
    let page = Pagination::new(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let result = directory::list_employees(store.get_ref(), &auth, criteria, page).await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        employees: result.entries.into_iter().map(EmployeeResponse::from).collect(),
        total: result.total,
        page: result.page,
        limit: result.limit,
        total_pages: result.total_pages,
    }))
}

/// Get employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(
        ("id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Outside the caller's division"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let entry = directory::get_employee(store.get_ref(), &auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(EmployeeResponse::from(entry)))
}
