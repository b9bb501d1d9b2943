use crate::api::local_now;
use crate::error::AppResult;
use crate::store::Store;
use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "connected")]
    pub database: String,
    #[schema(example = "2026-01-05T08:00:00")]
    pub timestamp: String,
}

/// Liveness plus a database round trip
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthResponse),
        (status = 503, description = "Database unreachable")
    ),
    tag = "Health"
)]
pub async fn health(store: web::Data<dyn Store>) -> AppResult<HttpResponse> {
    store.ping().await?;

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        database: "connected".to_string(),
        timestamp: local_now().format("%Y-%m-%dT%H:%M:%S").to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use actix_web::{App, test, web::Data};
    use serde_json::Value;
    use std::sync::Arc;

    #[actix_web::test]
    async fn reports_database_state() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::from(store))
                .route("/health", web::get().to(health)),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }
}
