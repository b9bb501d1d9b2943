use crate::auth::auth::AuthUser;
use crate::directory;
use crate::error::AppResult;
use crate::store::Store;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DepartmentQuery {
    /// Only departments of this division
    pub division_id: Option<u64>,
}

/// Active divisions with head counts
#[utoipa::path(
    get,
    path = "/api/divisions",
    responses(
        (
            status = 200,
            description = "Divisions; a manager sees only their own",
            body = [crate::model::division::DivisionSummary]
        ),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Organisation"
)]
pub async fn list_divisions(auth: AuthUser, store: web::Data<dyn Store>) -> AppResult<HttpResponse> {
    let divisions = directory::list_divisions(store.get_ref(), &auth).await?;
    Ok(HttpResponse::Ok().json(divisions))
}

/// Active departments with their division name
#[utoipa::path(
    get,
    path = "/api/departments",
    params(DepartmentQuery),
    responses(
        (status = 200, description = "Departments", body = [crate::model::department::DepartmentSummary]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Organisation"
)]
pub async fn list_departments(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<DepartmentQuery>,
) -> AppResult<HttpResponse> {
    let departments = directory::list_departments(store.get_ref(), &auth, query.division_id).await?;
    Ok(HttpResponse::Ok().json(departments))
}

/// Active shifts, times as `HH:MM`
#[utoipa::path(
    get,
    path = "/api/shifts",
    responses(
        (status = 200, description = "Shifts", body = [crate::model::shift::Shift]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Organisation"
)]
pub async fn list_shifts(_auth: AuthUser, store: web::Data<dyn Store>) -> AppResult<HttpResponse> {
    let shifts = directory::list_shifts(store.get_ref()).await?;
    Ok(HttpResponse::Ok().json(shifts))
}
