use crate::api::local_now;
use crate::auth::auth::AuthUser;
use crate::directory;
use crate::error::AppResult;
use crate::store::Store;
use actix_web::{HttpResponse, web};

/// Today's headline numbers for admins and managers
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard counters", body = crate::directory::DashboardStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Employees have no dashboard")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn dashboard_stats(auth: AuthUser, store: web::Data<dyn Store>) -> AppResult<HttpResponse> {
    let stats = directory::dashboard(store.get_ref(), &auth, local_now().date()).await?;
    Ok(HttpResponse::Ok().json(stats))
}
