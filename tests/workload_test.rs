//! Workload counter maintenance: accumulation across bookings, the zero
//! floor, and the in-database arithmetic the counters are written with.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use fieldserve_api::{
    auth::{Actor, Role},
    entities::technician::TechnicianStatus,
    errors::ServiceError,
    services::{booking_status::TransitionRequest, workload},
};
use fieldserve_api::entities::booking::BookingStatus;
use uuid::Uuid;

#[tokio::test]
async fn counters_accumulate_across_bookings() {
    let app = TestApp::new().await;
    let customer = app.customer();
    let admin = app.admin();
    let tech = app.seed_technician(TechnicianStatus::Active, "hvac").await;

    let first = app.create_pending_booking(&customer).await;
    let second = app.create_pending_booking(&customer).await;
    for booking in [&first, &second] {
        app.services
            .assignments
            .assign(&admin, booking.booking.id, tech.id, None)
            .await
            .unwrap();
    }
    assert_eq!(app.fetch_technician(tech.id).await.assigned_jobs, 2);

    // Completing one swaps a unit from assigned to completed and leaves
    // the other booking's load in place.
    let technician = Actor::new(tech.id, Role::Technician);
    for status in [BookingStatus::InProgress, BookingStatus::Completed] {
        app.services
            .booking_status
            .transition(
                &technician,
                first.booking.id,
                TransitionRequest {
                    status,
                    technician_id: None,
                    notes: None,
                    final_price: None,
                },
            )
            .await
            .unwrap();
    }
    let row = app.fetch_technician(tech.id).await;
    assert_eq!(row.assigned_jobs, 1);
    assert_eq!(row.completed_jobs, 1);
}

#[tokio::test]
async fn completion_never_drives_the_counter_negative() {
    let app = TestApp::new().await;
    let tech = app.seed_technician(TechnicianStatus::Active, "hvac").await;

    // Counter is zero; the completion is still recorded.
    workload::on_completed(&*app.db, tech.id).await.unwrap();
    let row = app.fetch_technician(tech.id).await;
    assert_eq!(row.assigned_jobs, 0);
    assert_eq!(row.completed_jobs, 1);
}

#[tokio::test]
async fn cancellation_with_zero_counter_is_a_no_op() {
    let app = TestApp::new().await;
    let tech = app.seed_technician(TechnicianStatus::Active, "hvac").await;

    workload::on_cancelled(&*app.db, tech.id).await.unwrap();
    let row = app.fetch_technician(tech.id).await;
    assert_eq!(row.assigned_jobs, 0);
    assert_eq!(row.completed_jobs, 0);
}

#[tokio::test]
async fn unknown_technician_is_not_found() {
    let app = TestApp::new().await;
    for result in [
        workload::on_assigned(&*app.db, Uuid::new_v4()).await,
        workload::on_completed(&*app.db, Uuid::new_v4()).await,
        workload::on_cancelled(&*app.db, Uuid::new_v4()).await,
    ] {
        assert_matches!(result.unwrap_err(), ServiceError::NotFound(_));
    }
}
