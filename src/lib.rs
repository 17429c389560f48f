//! FieldServe API Library
//!
//! Core functionality for the FieldServe home-services backend: the booking
//! lifecycle (status transitions, technician assignment, workload counters)
//! and the post-completion review subsystem.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::ToSchema;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Common query parameters for list endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

/// Common response wrapper.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

/// Versioned API routes.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/bookings",
            post(handlers::bookings::create_booking).get(handlers::bookings::list_bookings),
        )
        .route("/bookings/:id", get(handlers::bookings::get_booking))
        .route(
            "/bookings/:id/assign",
            post(handlers::bookings::assign_technician),
        )
        .route(
            "/bookings/:id/status",
            post(handlers::bookings::update_job_status),
        )
        .route(
            "/bookings/:id/cancel",
            post(handlers::bookings::cancel_booking),
        )
        .route(
            "/bookings/:id/confirm",
            post(handlers::bookings::confirm_booking),
        )
        .route(
            "/bookings/:id/assignments",
            get(handlers::bookings::assignment_history),
        )
        .route(
            "/bookings/:id/review",
            post(handlers::reviews::submit_review),
        )
        .route(
            "/reviews/:id/moderate",
            post(handlers::reviews::moderate_review),
        )
        .route(
            "/reviews/:id/helpful",
            post(handlers::reviews::mark_helpful),
        )
        .route(
            "/technicians/:id/rating",
            get(handlers::reviews::technician_rating),
        )
        .route(
            "/services/:id/rating",
            get(handlers::reviews::service_rating),
        )
}

/// Assembles the full application router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_v1_routes())
        .merge(handlers::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
