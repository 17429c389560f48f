pub mod bookings;
pub mod reviews;

use std::sync::Arc;

use axum::{response::Json, routing::get};
use serde_json::{json, Value};

use crate::db::DbPool;
use crate::events::EventSender;

pub use crate::AppState;

/// Services layer consumed by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub bookings: Arc<crate::services::bookings::BookingService>,
    pub booking_status: Arc<crate::services::booking_status::BookingStatusService>,
    pub assignments: Arc<crate::services::assignments::AssignmentService>,
    pub reviews: Arc<crate::services::reviews::ReviewService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let bookings = Arc::new(crate::services::bookings::BookingService::new(
            db.clone(),
            Some(event_sender.clone()),
        ));
        let assignments = Arc::new(crate::services::assignments::AssignmentService::new(
            db.clone(),
            Some(event_sender.clone()),
        ));
        let booking_status = Arc::new(crate::services::booking_status::BookingStatusService::new(
            db.clone(),
            Some(event_sender.clone()),
            assignments.clone(),
        ));
        let reviews = Arc::new(crate::services::reviews::ReviewService::new(
            db,
            Some(event_sender),
        ));

        Self {
            bookings,
            booking_status,
            assignments,
            reviews,
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub fn health_routes() -> axum::Router<AppState> {
    axum::Router::new().route("/health", get(health))
}
