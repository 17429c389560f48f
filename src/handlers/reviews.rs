use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::reviews::{ModerateReviewRequest, SubmitReviewRequest},
    ApiResponse, AppState,
};

pub async fn submit_review(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<SubmitReviewRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state
        .services
        .reviews
        .submit_review(&actor, booking_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(review))))
}

pub async fn moderate_review(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(review_id): Path<Uuid>,
    Json(request): Json<ModerateReviewRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state
        .services
        .reviews
        .moderate(&actor, review_id, request)
        .await?;
    Ok(Json(ApiResponse::success(review)))
}

pub async fn mark_helpful(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Path(review_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state.services.reviews.mark_helpful(review_id).await?;
    Ok(Json(ApiResponse::success(review)))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingResponse {
    pub id: Uuid,
    /// None when no published reviews exist yet.
    pub average_rating: Option<Decimal>,
    pub review_count: usize,
}

pub async fn technician_rating(
    State(state): State<AppState>,
    Path(technician_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let reviews = state
        .services
        .reviews
        .published_for_technician(technician_id)
        .await?;
    let average_rating = state
        .services
        .reviews
        .technician_rating(technician_id)
        .await?;
    Ok(Json(ApiResponse::success(RatingResponse {
        id: technician_id,
        average_rating,
        review_count: reviews.len(),
    })))
}

pub async fn service_rating(
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let reviews = state
        .services
        .reviews
        .published_for_service(service_id)
        .await?;
    let average_rating = state.services.reviews.service_rating(service_id).await?;
    Ok(Json(ApiResponse::success(RatingResponse {
        id: service_id,
        average_rating,
        review_count: reviews.len(),
    })))
}
