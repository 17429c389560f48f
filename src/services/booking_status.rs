//! Status transition engine: the single authority for booking-status
//! changes. Every transition runs inside one transaction; the status write
//! is a conditional update on (id, status, version) so a concurrent writer
//! loses deterministically instead of silently overwriting.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelBehavior, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{policy, Actor, Operation, Role},
    db::DbPool,
    entities::booking::{self, BookingStatus, Entity as BookingEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::assignments::{AssignmentOutcome, AssignmentService},
    services::bookings::BookingResponse,
    services::workload,
};

/// A requested status change, with the optional fields some transitions
/// carry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransitionRequest {
    pub status: BookingStatus,
    /// Required when requesting `assigned`.
    pub technician_id: Option<Uuid>,
    /// Appended to the booking's internal notes, never overwriting.
    pub notes: Option<String>,
    /// Accepted only with `completed`; `estimated_price` is retained.
    pub final_price: Option<i64>,
}

/// Outcome of a transition. Assignment is the one transition that returns
/// more than the updated booking.
#[derive(Debug, Serialize)]
pub enum TransitionOutcome {
    Updated(BookingResponse),
    Assigned(AssignmentOutcome),
}

/// Appends a timestamped, attributed note to the internal notes blob.
pub(crate) fn append_internal_note(
    existing: Option<&str>,
    note: &str,
    actor: &Actor,
    at: DateTime<Utc>,
) -> String {
    let entry = format!("[{} {}] {}", at.format("%Y-%m-%dT%H:%M:%SZ"), actor.role, note);
    match existing {
        Some(prior) if !prior.is_empty() => format!("{}\n{}", prior, entry),
        _ => entry,
    }
}

/// Conditional status write shared with the assignment coordinator.
/// Filtering on the snapshot's (id, status, version) makes a committed
/// concurrent writer visible as `rows_affected == 0`; the caller's request
/// then fails against the observed status instead of overwriting it.
pub(crate) async fn versioned_booking_update<C: ConnectionTrait>(
    conn: &C,
    snapshot: &booking::Model,
    update: booking::ActiveModel,
) -> Result<(), ServiceError> {
    let result = BookingEntity::update_many()
        .set(update)
        .filter(booking::Column::Id.eq(snapshot.id))
        .filter(booking::Column::Status.eq(snapshot.status))
        .filter(booking::Column::Version.eq(snapshot.version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        let observed = BookingEntity::find_by_id(snapshot.id)
            .one(conn)
            .await?
            .map(|b| b.status.to_string())
            .unwrap_or_else(|| "unknown".into());
        return Err(ServiceError::InvalidState(format!(
            "booking {} was concurrently moved to '{}'",
            snapshot.id, observed
        )));
    }
    Ok(())
}

/// Legal (from, to) pairs. Role and ownership gating happen separately;
/// this is only the shape of the state machine.
fn transition_allowed(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;
    match (from, to) {
        (Pending, Confirmed) => true,
        (Pending, Assigned) | (Confirmed, Assigned) => true,
        (Assigned, InProgress) | (Confirmed, InProgress) => true,
        (InProgress, Completed) => true,
        (from, Cancelled) => !from.is_terminal(),
        _ => false,
    }
}

/// Role gate for a requested target status. `pending` and `refunded` are
/// never valid targets: bookings are born pending, and refund marking
/// belongs to the external payment collaborator.
fn operation_for(to: BookingStatus) -> Option<Operation> {
    match to {
        BookingStatus::Confirmed => Some(Operation::ConfirmBooking),
        BookingStatus::Assigned => Some(Operation::AssignTechnician),
        BookingStatus::InProgress => Some(Operation::StartJob),
        BookingStatus::Completed => Some(Operation::CompleteJob),
        BookingStatus::Cancelled => Some(Operation::CancelBooking),
        BookingStatus::Pending | BookingStatus::Refunded => None,
    }
}

#[derive(Clone)]
pub struct BookingStatusService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    assignments: Arc<AssignmentService>,
}

impl BookingStatusService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        assignments: Arc<AssignmentService>,
    ) -> Self {
        Self {
            db,
            event_sender,
            assignments,
        }
    }

    /// Applies a role-gated status change to a booking.
    #[instrument(skip(self, request), fields(booking_id = %booking_id, requested = %request.status, actor_role = %actor.role))]
    pub async fn transition(
        &self,
        actor: &Actor,
        booking_id: Uuid,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, ServiceError> {
        let to = request.status;

        if request.final_price.is_some() && to != BookingStatus::Completed {
            return Err(ServiceError::ValidationError(
                "final_price may only accompany a completion".into(),
            ));
        }
        if let Some(price) = request.final_price {
            if price < 0 {
                return Err(ServiceError::ValidationError(
                    "final_price must be non-negative".into(),
                ));
            }
        }

        // Assignment has its own coordinator with the audit-trail write.
        if to == BookingStatus::Assigned {
            let technician_id = request.technician_id.ok_or_else(|| {
                ServiceError::ValidationError(
                    "technician_id is required when assigning a booking".into(),
                )
            })?;
            let outcome = self
                .assignments
                .assign(actor, booking_id, technician_id, request.notes)
                .await?;
            return Ok(TransitionOutcome::Assigned(outcome));
        }

        let db = &*self.db;
        let now = Utc::now();
        let txn = db.begin().await?;

        let current = BookingEntity::find_by_id(booking_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booking {} not found", booking_id)))?;
        let from = current.status;

        if !transition_allowed(from, to) {
            return Err(ServiceError::InvalidTransition { from, to });
        }

        let op = operation_for(to).ok_or(ServiceError::InvalidTransition { from, to })?;
        if !policy::allows(actor.role, op) {
            return Err(ServiceError::Forbidden(format!(
                "role '{}' may not move a booking to '{}'",
                actor.role, to
            )));
        }

        // Ownership gates on top of the role gate.
        match to {
            BookingStatus::InProgress | BookingStatus::Completed => {
                if current.technician_id != Some(actor.id) {
                    return Err(ServiceError::Forbidden(
                        "only the assigned technician may update this job".into(),
                    ));
                }
            }
            BookingStatus::Cancelled => {
                if actor.role == Role::Client && current.customer_id != actor.id {
                    return Err(ServiceError::Forbidden(
                        "booking belongs to another customer".into(),
                    ));
                }
            }
            _ => {}
        }

        let mut update = booking::ActiveModel::new();
        update.status = Set(to);
        update.updated_at = Set(now);
        update.version = Set(current.version + 1);
        if let Some(text) = request.notes.as_deref() {
            update.internal_notes = Set(Some(append_internal_note(
                current.internal_notes.as_deref(),
                text,
                actor,
                now,
            )));
        }
        if to == BookingStatus::Completed {
            update.completed_at = Set(Some(now));
            if let Some(price) = request.final_price {
                update.final_price = Set(Some(price));
            }
        }

        versioned_booking_update(&txn, &current, update).await?;

        // Counter writes commit atomically with the status write.
        match to {
            BookingStatus::Completed => {
                if let Some(technician_id) = current.technician_id {
                    workload::on_completed(&txn, technician_id).await?;
                }
            }
            BookingStatus::Cancelled => {
                if let Some(technician_id) = current.technician_id {
                    if matches!(from, BookingStatus::Assigned | BookingStatus::InProgress) {
                        workload::on_cancelled(&txn, technician_id).await?;
                    }
                }
            }
            _ => {}
        }

        let updated = BookingEntity::find_by_id(booking_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::InternalError("booking vanished mid-transition".into()))?;

        txn.commit().await?;

        info!(booking_id = %booking_id, from = %from, to = %to, "booking status updated");

        if let Some(sender) = &self.event_sender {
            let follow_up = match to {
                BookingStatus::Completed => current.technician_id.map(|technician_id| {
                    Event::BookingCompleted {
                        booking_id,
                        technician_id,
                    }
                }),
                BookingStatus::Cancelled => Some(Event::BookingCancelled { booking_id }),
                _ => None,
            };
            let status_event = Event::BookingStatusChanged {
                booking_id,
                old_status: from,
                new_status: to,
            };
            if let Err(e) = sender.send(status_event).await {
                warn!(error = %e, booking_id = %booking_id, "failed to send status changed event");
            }
            if let Some(event) = follow_up {
                if let Err(e) = sender.send(event).await {
                    warn!(error = %e, booking_id = %booking_id, "failed to send lifecycle event");
                }
            }
        }

        let include_internal = actor.role != Role::Client;
        Ok(TransitionOutcome::Updated(BookingResponse::from_model(
            updated,
            include_internal,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_shape() {
        use BookingStatus::*;
        // Forward path
        assert!(transition_allowed(Pending, Confirmed));
        assert!(transition_allowed(Pending, Assigned));
        assert!(transition_allowed(Confirmed, Assigned));
        assert!(transition_allowed(Assigned, InProgress));
        assert!(transition_allowed(Confirmed, InProgress));
        assert!(transition_allowed(InProgress, Completed));
        // Cancellation from any non-terminal state
        for from in [Pending, Confirmed, Assigned, InProgress] {
            assert!(transition_allowed(from, Cancelled));
        }
        // Terminal states admit nothing
        for from in [Completed, Cancelled, Refunded] {
            for to in [Pending, Confirmed, Assigned, InProgress, Completed, Cancelled, Refunded] {
                assert!(!transition_allowed(from, to));
            }
        }
        // No skipping ahead
        assert!(!transition_allowed(Pending, InProgress));
        assert!(!transition_allowed(Pending, Completed));
        assert!(!transition_allowed(Assigned, Completed));
        // Refunded is never a valid engine target
        for from in [Pending, Confirmed, Assigned, InProgress] {
            assert!(!transition_allowed(from, Refunded));
        }
    }

    #[test]
    fn notes_append_never_overwrite() {
        let actor = Actor::new(Uuid::new_v4(), Role::Admin);
        let at = Utc::now();
        let first = append_internal_note(None, "first note", &actor, at);
        assert!(first.contains("first note"));
        assert!(first.contains("admin"));

        let second = append_internal_note(Some(&first), "second note", &actor, at);
        assert!(second.contains("first note"));
        assert!(second.contains("second note"));
        assert!(second.find("first note").unwrap() < second.find("second note").unwrap());
    }

    #[test]
    fn pending_and_refunded_have_no_operation() {
        assert!(operation_for(BookingStatus::Pending).is_none());
        assert!(operation_for(BookingStatus::Refunded).is_none());
        assert_eq!(
            operation_for(BookingStatus::Cancelled),
            Some(Operation::CancelBooking)
        );
    }

    #[tokio::test]
    async fn stale_snapshot_loses_the_conditional_update() {
        use crate::entities::booking::TimeSlot;
        use sea_orm::{ActiveModelTrait, Database};
        use sea_orm_migration::MigratorTrait;

        let db = Database::connect("sqlite::memory:").await.unwrap();
        crate::migrator::Migrator::up(&db, None).await.unwrap();

        let now = Utc::now();
        let snapshot = booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_number: Set("BK-000001".into()),
            customer_id: Set(Uuid::new_v4()),
            service_id: Set(Uuid::new_v4()),
            pricing_option_id: Set(None),
            address_id: Set(Uuid::new_v4()),
            technician_id: Set(None),
            payment_id: Set(None),
            status: Set(BookingStatus::Pending),
            scheduled_date: Set(chrono::NaiveDate::from_ymd_opt(2026, 9, 14).unwrap()),
            time_slot: Set(TimeSlot::Morning),
            estimated_price: Set(10_000),
            final_price: Set(None),
            is_emergency: Set(false),
            notes: Set(None),
            internal_notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            completed_at: Set(None),
            version: Set(1),
        }
        .insert(&db)
        .await
        .unwrap();

        // First writer commits against the snapshot and wins.
        let mut winner = booking::ActiveModel::new();
        winner.status = Set(BookingStatus::Assigned);
        winner.version = Set(snapshot.version + 1);
        winner.updated_at = Set(Utc::now());
        versioned_booking_update(&db, &snapshot, winner)
            .await
            .expect("first writer wins");

        // Second writer still holds the stale snapshot: its conditional
        // update matches zero rows and the error names the observed status.
        let mut loser = booking::ActiveModel::new();
        loser.status = Set(BookingStatus::Confirmed);
        loser.version = Set(snapshot.version + 1);
        loser.updated_at = Set(Utc::now());
        let err = versioned_booking_update(&db, &snapshot, loser)
            .await
            .unwrap_err();
        match err {
            ServiceError::InvalidState(msg) => {
                assert!(msg.contains("concurrently moved"));
                assert!(msg.contains("assigned"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // The winner's write stands.
        let stored = BookingEntity::find_by_id(snapshot.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, BookingStatus::Assigned);
        assert_eq!(stored.version, 2);
    }
}
