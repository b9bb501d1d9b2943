use crate::api::local_now;
use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::model::leave_request::{LeaveRequest, LeaveRequestEntry, RequestStatus, RequestType};
use crate::query::RequestFilter;
use crate::store::Store;
use crate::workflow::{self, Decision, SubmitRequest};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct RequesterBrief {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = "John Doe")]
    pub full_name: String,
    #[schema(example = "john.doe@factory.com")]
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct RequestEmployeeBrief {
    #[schema(example = "EMP002")]
    pub employee_code: String,
    #[schema(example = "Production Operator")]
    pub position: String,
}

#[derive(Serialize, ToSchema)]
pub struct ApproverBrief {
    #[schema(example = 2)]
    pub id: u64,
    #[schema(example = "Production Manager")]
    pub full_name: String,
}

/// A request with who asked for it and who decided it.
#[derive(Serialize, ToSchema)]
pub struct RequestItem {
    #[serde(flatten)]
    pub request: LeaveRequest,
    pub user: RequesterBrief,
    pub employee: RequestEmployeeBrief,
    #[schema(nullable = true)]
    pub approver: Option<ApproverBrief>,
}

impl From<LeaveRequestEntry> for RequestItem {
    fn from(entry: LeaveRequestEntry) -> Self {
        let approver = entry
            .request
            .approved_by
            .zip(entry.approver_name)
            .map(|(id, full_name)| ApproverBrief { id, full_name });

        Self {
            user: RequesterBrief {
                id: entry.request.user_id,
                full_name: entry.full_name,
                email: entry.email,
            },
            employee: RequestEmployeeBrief {
                employee_code: entry.employee_code,
                position: entry.position,
            },
            approver,
            request: entry.request,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SubmitResponse {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "Request submitted successfully")]
    pub message: String,
    pub status: RequestStatus,
    pub request_type: RequestType,
}

#[derive(Serialize, ToSchema)]
pub struct RequestActionResponse {
    #[schema(example = "Request approved successfully")]
    pub message: String,
    pub request: LeaveRequest,
}

/* =========================
List requests
========================= */
#[utoipa::path(
    get,
    path = "/api/requests",
    params(RequestFilter),
    responses(
        (status = 200, description = "Requests visible to the caller, newest first", body = [RequestItem]),
        (status = 400, description = "Unknown status or request type"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn list_requests(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    filter: web::Query<RequestFilter>,
) -> AppResult<HttpResponse> {
    let entries = workflow::list(store.get_ref(), &auth, filter.into_inner()).await?;
    let items: Vec<RequestItem> = entries.into_iter().map(RequestItem::from).collect();

    Ok(HttpResponse::Ok().json(items))
}

/* =========================
Get single request
========================= */
#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    params(
        ("id" = u64, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request found", body = RequestItem),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Request not found or not visible")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn get_request(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let entry = workflow::get(store.get_ref(), &auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(RequestItem::from(entry)))
}

/* =========================
Submit request
========================= */
#[utoipa::path(
    post,
    path = "/api/requests",
    request_body(
        content = SubmitRequest,
        description = "Request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Request submitted", body = SubmitResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn create_request(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    payload: web::Json<SubmitRequest>,
) -> AppResult<HttpResponse> {
    let request = workflow::submit(store.get_ref(), &auth, &payload, local_now()).await?;

    Ok(HttpResponse::Created().json(SubmitResponse {
        id: request.id,
        message: "Request submitted successfully".to_string(),
        status: request.status,
        request_type: request.request_type,
    }))
}

async fn decide(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
    decision: Decision,
) -> AppResult<HttpResponse> {
    let request =
        workflow::decide(store.get_ref(), &auth, path.into_inner(), decision, local_now()).await?;
    let message = match decision {
        Decision::Approve => "Request approved successfully",
        Decision::Reject => "Request rejected successfully",
    };

    Ok(HttpResponse::Ok().json(RequestActionResponse {
        message: message.to_string(),
        request,
    }))
}

/* =========================
Approve request
========================= */
#[utoipa::path(
    put,
    path = "/api/requests/{id}/approve",
    params(
        ("id" = u64, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request approved", body = RequestActionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an approver for this request"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request has already been processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn approve_request(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    decide(auth, store, path, Decision::Approve).await
}

/* =========================
Reject request
========================= */
#[utoipa::path(
    put,
    path = "/api/requests/{id}/reject",
    params(
        ("id" = u64, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request rejected", body = RequestActionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an approver for this request"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request has already been processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn reject_request(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    decide(auth, store, path, Decision::Reject).await
}

/* =========================
Cancel own request
========================= */
#[utoipa::path(
    put,
    path = "/api/requests/{id}/cancel",
    params(
        ("id" = u64, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request cancelled", body = RequestActionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the requester can cancel"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request has already been processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn cancel_request(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let request = workflow::cancel(store.get_ref(), &auth, path.into_inner(), local_now()).await?;

    Ok(HttpResponse::Ok().json(RequestActionResponse {
        message: "Request cancelled successfully".to_string(),
        request,
    }))
}
