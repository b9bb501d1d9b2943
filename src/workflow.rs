//! Leave / shift-change / overtime requests.
//!
//! `pending` is the only open state. Approve and reject record who decided
//! and when; cancel is the requester withdrawing a pending request.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::policy;
use crate::error::{AppError, AppResult, Conflict};
use crate::model::leave_request::{LeaveRequest, LeaveRequestEntry, RequestStatus, RequestType};
use crate::model::user::User;
use crate::query::{RequestCriteria, RequestFilter};
use crate::store::{NewLeaveRequest, StatusChange, Store};

/// Submission payload as received; every field is validated here.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SubmitRequest {
    /// `leave` (default), `shift_change` or `overtime`
    #[schema(example = "leave")]
    pub request_type: Option<String>,
    #[schema(example = "2026-02-01")]
    pub start_date: Option<String>,
    #[schema(example = "2026-02-03")]
    pub end_date: Option<String>,
    #[schema(example = "Family event")]
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn outcome(self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidRequest {
    pub request_type: RequestType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub reason: String,
    pub notes: Option<String>,
}

fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("{field} must be a date in YYYY-MM-DD format")))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn validate(payload: &SubmitRequest) -> AppResult<ValidRequest> {
    let request_type = match non_blank(payload.request_type.as_deref()) {
        Some(raw) => raw.parse().map_err(|_| {
            AppError::validation("request_type must be one of leave, shift_change, overtime")
        })?,
        None => RequestType::default(),
    };

    let start_date = non_blank(payload.start_date.as_deref())
        .ok_or_else(|| AppError::validation("start_date is required"))
        .and_then(|raw| parse_date("start_date", raw))?;

    let end_date = non_blank(payload.end_date.as_deref())
        .map(|raw| parse_date("end_date", raw))
        .transpose()?;
    if end_date.is_some_and(|end| end < start_date) {
        return Err(AppError::validation("end_date cannot be before start_date"));
    }

    let reason = non_blank(payload.reason.as_deref())
        .ok_or_else(|| AppError::validation("reason is required"))?
        .to_string();

    Ok(ValidRequest {
        request_type,
        start_date,
        end_date,
        reason,
        notes: non_blank(payload.notes.as_deref()).map(str::to_string),
    })
}

pub async fn submit(
    store: &dyn Store,
    actor: &User,
    payload: &SubmitRequest,
    now: NaiveDateTime,
) -> AppResult<LeaveRequest> {
    let employee = store
        .find_employee_by_user(actor.id)
        .await?
        .ok_or(AppError::NoEmployeeRecord)?;
    let valid = validate(payload)?;

    let request = store
        .insert_request(&NewLeaveRequest {
            user_id: actor.id,
            employee_id: employee.id,
            request_type: valid.request_type,
            start_date: valid.start_date,
            end_date: valid.end_date,
            reason: valid.reason,
            notes: valid.notes,
            created_at: now,
        })
        .await?;

    info!(
        request_id = request.id,
        user_id = actor.id,
        request_type = %request.request_type,
        "Request submitted"
    );
    Ok(request)
}

/// Approve or reject a pending request.
pub async fn decide(
    store: &dyn Store,
    actor: &User,
    request_id: u64,
    decision: Decision,
    now: NaiveDateTime,
) -> AppResult<LeaveRequest> {
    policy::require_approver(actor)?;

    let entry = store
        .find_request(request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Request not found"))?;

    let employee = store
        .find_employee(entry.request.employee_id)
        .await?
        .ok_or_else(|| AppError::forbidden("Access denied"))?;
    if !policy::can_approve(actor, &employee)? {
        return Err(AppError::forbidden("Access denied"));
    }

    if entry.request.status.is_terminal() {
        return Err(Conflict::InvalidState.into());
    }

    let change = StatusChange {
        to: decision.outcome(),
        decided_by: Some(actor.id),
        at: now,
    };
    if !store.update_request_status(request_id, &change).await? {
        return Err(Conflict::InvalidState.into());
    }

    info!(
        request_id,
        decided_by = actor.id,
        status = %change.to,
        "Request decided"
    );

    let mut request = entry.request;
    request.status = change.to;
    request.approved_by = Some(actor.id);
    request.approved_at = Some(now);
    request.updated_at = Some(now);
    Ok(request)
}

/// The requester withdraws their own pending request.
pub async fn cancel(
    store: &dyn Store,
    actor: &User,
    request_id: u64,
    now: NaiveDateTime,
) -> AppResult<LeaveRequest> {
    let entry = store
        .find_request(request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Request not found"))?;

    if entry.request.user_id != actor.id {
        return Err(AppError::forbidden("Only the requester can cancel a request"));
    }
    if entry.request.status.is_terminal() {
        return Err(Conflict::InvalidState.into());
    }

    let change = StatusChange {
        to: RequestStatus::Cancelled,
        decided_by: None,
        at: now,
    };
    if !store.update_request_status(request_id, &change).await? {
        return Err(Conflict::InvalidState.into());
    }

    info!(request_id, user_id = actor.id, "Request cancelled");

    let mut request = entry.request;
    request.status = RequestStatus::Cancelled;
    request.updated_at = Some(now);
    Ok(request)
}

/// A single request; anything outside the actor's scope reads as missing.
pub async fn get(store: &dyn Store, actor: &User, request_id: u64) -> AppResult<LeaveRequestEntry> {
    let scope = policy::resolve_scope(actor)?;

    store
        .find_request(request_id)
        .await?
        .filter(|entry| scope.covers(entry.request.user_id, entry.division_id))
        .ok_or_else(|| AppError::not_found("Request not found"))
}

pub async fn list(
    store: &dyn Store,
    actor: &User,
    filter: RequestFilter,
) -> AppResult<Vec<LeaveRequestEntry>> {
    let criteria = RequestCriteria {
        scope: policy::resolve_scope(actor)?,
        filter,
    };
    store.list_requests(&criteria).await
}
