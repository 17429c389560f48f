use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    entities::booking::BookingStatus,
    errors::ServiceError,
    services::booking_status::{TransitionOutcome, TransitionRequest},
    ApiResponse, AppState, ListQuery,
};

/// Resolves a path identifier that may be a UUID or a booking number.
async fn resolve_booking_id(state: &AppState, id: &str) -> Result<Uuid, ServiceError> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Ok(uuid);
    }
    if let Some(uuid) = state.services.bookings.find_booking_id_by_number(id).await? {
        return Ok(uuid);
    }
    Err(ServiceError::NotFound(format!("Booking {} not found", id)))
}

pub async fn create_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<crate::services::bookings::CreateBookingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.bookings.create_booking(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(detail))))
}

pub async fn get_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking_id = resolve_booking_id(&state, &id).await?;
    let detail = state.services.bookings.get_booking(&actor, booking_id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let list = state
        .services
        .bookings
        .list_bookings(&actor, query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(list)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignTechnicianRequest {
    pub technician_id: Uuid,
    pub note: Option<String>,
}

pub async fn assign_technician(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<AssignTechnicianRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking_id = resolve_booking_id(&state, &id).await?;
    let outcome = state
        .services
        .assignments
        .assign(&actor, booking_id, request.technician_id, request.note)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// Technician-facing status update: `in_progress` or `completed` only; the
/// transition engine enforces that the caller is the assigned technician.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobStatusRequest {
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub final_price: Option<i64>,
}

pub async fn update_job_status(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<JobStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    if !matches!(
        request.status,
        BookingStatus::InProgress | BookingStatus::Completed
    ) {
        return Err(ServiceError::ValidationError(format!(
            "job status updates accept in_progress or completed, got '{}'",
            request.status
        )));
    }
    let booking_id = resolve_booking_id(&state, &id).await?;
    let outcome = state
        .services
        .booking_status
        .transition(
            &actor,
            booking_id,
            TransitionRequest {
                status: request.status,
                technician_id: None,
                notes: request.notes,
                final_price: request.final_price,
            },
        )
        .await?;
    match outcome {
        TransitionOutcome::Updated(booking) => Ok(Json(ApiResponse::success(booking))),
        TransitionOutcome::Assigned(_) => Err(ServiceError::InternalError(
            "unexpected assignment outcome from job status update".into(),
        )),
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    request: Option<Json<CancelBookingRequest>>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking_id = resolve_booking_id(&state, &id).await?;
    let reason = request.and_then(|Json(r)| r.reason);
    let outcome = state
        .services
        .booking_status
        .transition(
            &actor,
            booking_id,
            TransitionRequest {
                status: BookingStatus::Cancelled,
                technician_id: None,
                notes: reason,
                final_price: None,
            },
        )
        .await?;
    match outcome {
        TransitionOutcome::Updated(booking) => Ok(Json(ApiResponse::success(booking))),
        TransitionOutcome::Assigned(_) => Err(ServiceError::InternalError(
            "unexpected assignment outcome from cancellation".into(),
        )),
    }
}

pub async fn confirm_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking_id = resolve_booking_id(&state, &id).await?;
    let outcome = state
        .services
        .booking_status
        .transition(
            &actor,
            booking_id,
            TransitionRequest {
                status: BookingStatus::Confirmed,
                technician_id: None,
                notes: None,
                final_price: None,
            },
        )
        .await?;
    match outcome {
        TransitionOutcome::Updated(booking) => Ok(Json(ApiResponse::success(booking))),
        TransitionOutcome::Assigned(_) => Err(ServiceError::InternalError(
            "unexpected assignment outcome from confirmation".into(),
        )),
    }
}

pub async fn assignment_history(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    // History includes admin attribution; gate it like internal notes.
    if actor.role == crate::auth::Role::Client {
        return Err(ServiceError::Forbidden(
            "assignment history is not customer-visible".into(),
        ));
    }
    let booking_id = resolve_booking_id(&state, &id).await?;
    let history = state.services.assignments.history(booking_id).await?;
    Ok(Json(ApiResponse::success(history)))
}
