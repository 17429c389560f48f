use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{policy, Actor, Operation},
    db::DbPool,
    entities::{
        booking::{self, BookingStatus, Entity as BookingEntity},
        job_assignment::{self, Entity as JobAssignmentEntity},
        service_offering::Entity as ServiceOfferingEntity,
        technician::{Entity as TechnicianEntity, TechnicianStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::bookings::{load_detail, BookingDetail},
    services::booking_status::{append_internal_note, versioned_booking_update},
    services::workload,
};

/// Result of a successful assignment: the enriched booking plus the
/// append-only audit record created for this event.
#[derive(Debug, Serialize)]
pub struct AssignmentOutcome {
    pub booking: BookingDetail,
    pub assignment: job_assignment::Model,
}

/// Binds exactly one technician to exactly one pending/confirmed booking,
/// transactionally. Re-assignment is unsupported: a booking that already
/// left `pending`/`confirmed` is rejected with `InvalidState`.
#[derive(Clone)]
pub struct AssignmentService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl AssignmentService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, note), fields(booking_id = %booking_id, technician_id = %technician_id, admin_id = %actor.id))]
    pub async fn assign(
        &self,
        actor: &Actor,
        booking_id: Uuid,
        technician_id: Uuid,
        note: Option<String>,
    ) -> Result<AssignmentOutcome, ServiceError> {
        if !policy::allows(actor.role, Operation::AssignTechnician) {
            return Err(ServiceError::Forbidden(
                "only admins may assign technicians".into(),
            ));
        }

        let db = &*self.db;
        let now = Utc::now();
        let txn = db.begin().await?;

        let booking = BookingEntity::find_by_id(booking_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booking {} not found", booking_id)))?;

        if !matches!(
            booking.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) {
            return Err(ServiceError::InvalidState(format!(
                "booking {} is '{}', only pending or confirmed bookings can be assigned",
                booking_id, booking.status
            )));
        }

        let technician = TechnicianEntity::find_by_id(technician_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Technician {} not found", technician_id))
            })?;

        if technician.status != TechnicianStatus::Active {
            return Err(ServiceError::TechnicianUnavailable(format!(
                "technician {} is '{}', only active technicians accept assignments",
                technician_id, technician.status
            )));
        }

        // Soft specialty check: a mismatch is logged, never fatal.
        // Availability wins over strict matching.
        if let Some(service) = ServiceOfferingEntity::find_by_id(booking.service_id)
            .one(&txn)
            .await?
        {
            if !technician.has_specialty(&service.category) && !technician.has_specialty(&service.name)
            {
                warn!(
                    technician_id = %technician_id,
                    service = %service.name,
                    category = %service.category,
                    specialties = %technician.specialties,
                    "assigning technician outside declared specialties"
                );
            }
        }

        // Conditional write: the status filter makes concurrent assigns of
        // the same booking mutually exclusive. The loser updates zero rows.
        let mut update = booking::ActiveModel::new();
        update.status = Set(BookingStatus::Assigned);
        update.technician_id = Set(Some(technician_id));
        update.updated_at = Set(now);
        update.version = Set(booking.version + 1);
        if let Some(text) = note.as_deref() {
            update.internal_notes = Set(Some(append_internal_note(
                booking.internal_notes.as_deref(),
                text,
                actor,
                now,
            )));
        }
        versioned_booking_update(&txn, &booking, update).await?;

        let assignment = job_assignment::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking_id),
            technician_id: Set(technician_id),
            assigned_by: Set(actor.id),
            note: Set(note),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        workload::on_assigned(&txn, technician_id).await?;

        let updated = BookingEntity::find_by_id(booking_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::InternalError("booking vanished mid-assignment".into()))?;
        let detail = load_detail(&txn, updated, true).await?;

        txn.commit().await?;

        info!(
            booking_id = %booking_id,
            technician_id = %technician_id,
            assignment_id = %assignment.id,
            "technician assigned"
        );

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::BookingAssigned {
                    booking_id,
                    technician_id,
                    assignment_id: assignment.id,
                })
                .await
            {
                warn!(error = %e, booking_id = %booking_id, "failed to send booking assigned event");
            }
        }

        Ok(AssignmentOutcome {
            booking: detail,
            assignment,
        })
    }

    /// Assignment history for a booking, oldest first.
    pub async fn history(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<job_assignment::Model>, ServiceError> {
        use sea_orm::QueryOrder;
        Ok(JobAssignmentEntity::find()
            .filter(job_assignment::Column::BookingId.eq(booking_id))
            .order_by_asc(job_assignment::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }
}
