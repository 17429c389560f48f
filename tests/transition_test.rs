//! Role gating and state-machine edges of the status transition engine.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use fieldserve_api::{
    auth::{Actor, Role},
    entities::{booking::BookingStatus, technician::TechnicianStatus},
    errors::ServiceError,
    services::booking_status::TransitionRequest,
};
use uuid::Uuid;

fn request(status: BookingStatus) -> TransitionRequest {
    TransitionRequest {
        status,
        technician_id: None,
        notes: None,
        final_price: None,
    }
}

#[tokio::test]
async fn pending_cannot_skip_ahead() {
    let app = TestApp::new().await;
    let customer = app.customer();
    let admin = app.admin();
    let detail = app.create_pending_booking(&customer).await;

    for target in [BookingStatus::InProgress, BookingStatus::Completed] {
        let err = app
            .services
            .booking_status
            .transition(&admin, detail.booking.id, request(target))
            .await
            .unwrap_err();
        assert_matches!(
            err,
            ServiceError::InvalidTransition {
                from: BookingStatus::Pending,
                ..
            }
        );
    }
}

#[tokio::test]
async fn refunded_is_never_an_engine_target() {
    let app = TestApp::new().await;
    let customer = app.customer();
    let admin = app.admin();
    let detail = app.create_pending_booking(&customer).await;

    let err = app
        .services
        .booking_status
        .transition(&admin, detail.booking.id, request(BookingStatus::Refunded))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition { .. });
}

#[tokio::test]
async fn only_the_assigned_technician_may_run_the_job() {
    let app = TestApp::new().await;
    let customer = app.customer();
    let admin = app.admin();

    let detail = app.create_pending_booking(&customer).await;
    let booking_id = detail.booking.id;
    let tech = app.seed_technician(TechnicianStatus::Active, "hvac").await;
    let other_tech = app.seed_technician(TechnicianStatus::Active, "hvac").await;
    app.services
        .assignments
        .assign(&admin, booking_id, tech.id, None)
        .await
        .unwrap();

    // A different technician cannot start the job.
    let imposter = Actor::new(other_tech.id, Role::Technician);
    let err = app
        .services
        .booking_status
        .transition(&imposter, booking_id, request(BookingStatus::InProgress))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    // The assigned technician starts it; the imposter still cannot complete.
    let assigned = Actor::new(tech.id, Role::Technician);
    app.services
        .booking_status
        .transition(&assigned, booking_id, request(BookingStatus::InProgress))
        .await
        .unwrap();
    let err = app
        .services
        .booking_status
        .transition(&imposter, booking_id, request(BookingStatus::Completed))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
}

#[tokio::test]
async fn clients_and_admins_cannot_run_jobs() {
    let app = TestApp::new().await;
    let customer = app.customer();
    let admin = app.admin();

    let detail = app.create_pending_booking(&customer).await;
    let booking_id = detail.booking.id;
    let tech = app.seed_technician(TechnicianStatus::Active, "hvac").await;
    app.services
        .assignments
        .assign(&admin, booking_id, tech.id, None)
        .await
        .unwrap();

    for actor in [customer, admin] {
        let err = app
            .services
            .booking_status
            .transition(&actor, booking_id, request(BookingStatus::InProgress))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Forbidden(_));
    }
}

#[tokio::test]
async fn cancellation_ownership_is_enforced() {
    let app = TestApp::new().await;
    let owner = app.customer();
    let detail = app.create_pending_booking(&owner).await;
    let booking_id = detail.booking.id;

    // Another customer cannot cancel someone else's booking.
    let stranger = app.customer();
    let err = app
        .services
        .booking_status
        .transition(&stranger, booking_id, request(BookingStatus::Cancelled))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    // A technician cannot cancel at all.
    let tech = app.seed_technician(TechnicianStatus::Active, "hvac").await;
    let err = app
        .services
        .booking_status
        .transition(
            &Actor::new(tech.id, Role::Technician),
            booking_id,
            request(BookingStatus::Cancelled),
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    // The owner can.
    app.services
        .booking_status
        .transition(&owner, booking_id, request(BookingStatus::Cancelled))
        .await
        .expect("owner cancellation succeeds");
    assert_eq!(
        app.fetch_booking(booking_id).await.status,
        BookingStatus::Cancelled
    );
}

#[tokio::test]
async fn confirmation_is_admin_only() {
    let app = TestApp::new().await;
    let customer = app.customer();
    let detail = app.create_pending_booking(&customer).await;

    let err = app
        .services
        .booking_status
        .transition(&customer, detail.booking.id, request(BookingStatus::Confirmed))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    app.services
        .booking_status
        .transition(&app.admin(), detail.booking.id, request(BookingStatus::Confirmed))
        .await
        .expect("admin confirmation succeeds");
}

#[tokio::test]
async fn final_price_only_accompanies_completion() {
    let app = TestApp::new().await;
    let customer = app.customer();
    let admin = app.admin();
    let detail = app.create_pending_booking(&customer).await;

    let err = app
        .services
        .booking_status
        .transition(
            &admin,
            detail.booking.id,
            TransitionRequest {
                status: BookingStatus::Confirmed,
                technician_id: None,
                notes: None,
                final_price: Some(9_000),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Also rejected on assignment, before the coordinator is consulted:
    // the price must not be silently dropped.
    let tech = app.seed_technician(TechnicianStatus::Active, "hvac").await;
    let err = app
        .services
        .booking_status
        .transition(
            &admin,
            detail.booking.id,
            TransitionRequest {
                status: BookingStatus::Assigned,
                technician_id: Some(tech.id),
                notes: None,
                final_price: Some(9_000),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // No side effects from the rejected attempts.
    let row = app.fetch_booking(detail.booking.id).await;
    assert_eq!(row.status, BookingStatus::Pending);
    assert!(row.technician_id.is_none());
    assert_eq!(row.final_price, None);
}

#[tokio::test]
async fn transition_on_missing_booking_is_not_found() {
    let app = TestApp::new().await;
    let err = app
        .services
        .booking_status
        .transition(&app.admin(), Uuid::new_v4(), request(BookingStatus::Confirmed))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}
