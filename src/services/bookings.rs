use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{policy, Actor, Operation, Role},
    db::DbPool,
    entities::{
        address::{self, Entity as AddressEntity},
        booking::{
            self, ActiveModel as BookingActiveModel, BookingStatus, Entity as BookingEntity,
            TimeSlot,
        },
        booking_contact::{self, Entity as BookingContactEntity},
        pricing_option::{self, Entity as PricingOptionEntity},
        service_offering::{self, Entity as ServiceOfferingEntity},
        technician::{self, Entity as TechnicianEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Request to create a booking. The price is never taken from the caller:
/// it is resolved server-side from the pricing catalog.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    pub service_id: Uuid,
    pub pricing_option_id: Uuid,
    pub address_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub time_slot: TimeSlot,
    #[validate(length(min = 1, max = 120, message = "Contact name is required"))]
    pub contact_name: String,
    #[validate(length(min = 5, max = 30, message = "Contact phone is required"))]
    pub contact_phone: String,
    #[validate(email(message = "Contact email must be valid"))]
    pub contact_email: Option<String>,
    #[validate(length(max = 2000, message = "Notes are limited to 2000 characters"))]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_emergency: bool,
}

/// Customer-safe view of a booking. `internal_notes` is populated only for
/// admins and the assigned technician.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    pub id: Uuid,
    pub booking_number: String,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub pricing_option_id: Option<Uuid>,
    pub address_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub status: BookingStatus,
    pub scheduled_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub estimated_price: i64,
    pub final_price: Option<i64>,
    pub is_emergency: bool,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_notes: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
    pub completed_at: Option<chrono::DateTime<Utc>>,
}

impl BookingResponse {
    pub fn from_model(model: booking::Model, include_internal: bool) -> Self {
        Self {
            id: model.id,
            booking_number: model.booking_number,
            customer_id: model.customer_id,
            service_id: model.service_id,
            pricing_option_id: model.pricing_option_id,
            address_id: model.address_id,
            technician_id: model.technician_id,
            status: model.status,
            scheduled_date: model.scheduled_date,
            time_slot: model.time_slot,
            estimated_price: model.estimated_price,
            final_price: model.final_price,
            is_emergency: model.is_emergency,
            notes: model.notes,
            internal_notes: if include_internal {
                model.internal_notes
            } else {
                None
            },
            created_at: model.created_at,
            updated_at: model.updated_at,
            completed_at: model.completed_at,
        }
    }
}

/// Booking with its related rows resolved.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetail {
    pub booking: BookingResponse,
    pub service: service_offering::Model,
    pub pricing_option: Option<pricing_option::Model>,
    pub address: address::Model,
    pub contact: Option<booking_contact::Model>,
    pub technician: Option<technician::Model>,
}

#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<BookingResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Resolves the related rows of a booking on the caller's connection.
/// Shared by the booking store and the assignment coordinator.
pub(crate) async fn load_detail<C: ConnectionTrait>(
    conn: &C,
    model: booking::Model,
    include_internal: bool,
) -> Result<BookingDetail, ServiceError> {
    let service = ServiceOfferingEntity::find_by_id(model.service_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            error!(booking_id = %model.id, "booking references a missing service");
            ServiceError::InternalError("booking references a missing service".into())
        })?;

    let pricing_option = match model.pricing_option_id {
        Some(id) => PricingOptionEntity::find_by_id(id).one(conn).await?,
        None => None,
    };

    let address = AddressEntity::find_by_id(model.address_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            error!(booking_id = %model.id, "booking references a missing address");
            ServiceError::InternalError("booking references a missing address".into())
        })?;

    let contact = BookingContactEntity::find()
        .filter(booking_contact::Column::BookingId.eq(model.id))
        .one(conn)
        .await?;

    let technician = match model.technician_id {
        Some(id) => TechnicianEntity::find_by_id(id).one(conn).await?,
        None => None,
    };

    Ok(BookingDetail {
        booking: BookingResponse::from_model(model, include_internal),
        service,
        pricing_option,
        address,
        contact,
        technician,
    })
}

/// Booking record store: creation and (ownership-gated) reads. All status
/// mutations live in `booking_status` / `assignments`.
#[derive(Clone)]
pub struct BookingService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl BookingService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a booking in `pending` with a server-computed price, a
    /// sequential booking number and a contact snapshot, all in one
    /// transaction.
    #[instrument(skip(self, request), fields(customer_id = %actor.id, service_id = %request.service_id))]
    pub async fn create_booking(
        &self,
        actor: &Actor,
        request: CreateBookingRequest,
    ) -> Result<BookingDetail, ServiceError> {
        if !policy::allows(actor.role, Operation::CreateBooking) {
            return Err(ServiceError::Forbidden(
                "only customers may create bookings".into(),
            ));
        }
        request.validate()?;

        let db = &*self.db;
        let now = Utc::now();
        let booking_id = Uuid::new_v4();

        let txn = db.begin().await?;

        let service = ServiceOfferingEntity::find_by_id(request.service_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Service {} not found", request.service_id))
            })?;
        if !service.active {
            return Err(ServiceError::ValidationError(format!(
                "Service '{}' is not currently bookable",
                service.name
            )));
        }

        // Total lookup over the pricing catalog: an unknown option, or one
        // belonging to a different service, fails loudly instead of pricing
        // the job at zero.
        let pricing = PricingOptionEntity::find_by_id(request.pricing_option_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Unknown pricing option {}",
                    request.pricing_option_id
                ))
            })?;
        if pricing.service_id != service.id {
            return Err(ServiceError::ValidationError(format!(
                "Pricing option '{}' does not belong to service '{}'",
                pricing.name, service.name
            )));
        }

        let address = AddressEntity::find_by_id(request.address_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Address {} not found", request.address_id))
            })?;
        if address.customer_id != actor.id {
            return Err(ServiceError::Forbidden(
                "address does not belong to the requesting customer".into(),
            ));
        }

        let sequence = BookingEntity::find().count(&txn).await? + 1;
        let booking_number = format!("BK-{:06}", sequence);

        let booking = BookingActiveModel {
            id: Set(booking_id),
            booking_number: Set(booking_number),
            customer_id: Set(actor.id),
            service_id: Set(service.id),
            pricing_option_id: Set(Some(pricing.id)),
            address_id: Set(address.id),
            technician_id: Set(None),
            payment_id: Set(None),
            status: Set(BookingStatus::Pending),
            scheduled_date: Set(request.scheduled_date),
            time_slot: Set(request.time_slot),
            estimated_price: Set(pricing.base_amount),
            final_price: Set(None),
            is_emergency: Set(request.is_emergency),
            notes: Set(request.notes.clone()),
            internal_notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            completed_at: Set(None),
            version: Set(1),
        }
        .insert(&txn)
        .await?;

        booking_contact::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking.id),
            name: Set(request.contact_name.clone()),
            phone: Set(request.contact_phone.clone()),
            email: Set(request.contact_email.clone()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let detail = load_detail(&txn, booking, false).await?;
        txn.commit().await?;

        info!(booking_id = %booking_id, booking_number = %detail.booking.booking_number, "booking created");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::BookingCreated {
                    booking_id,
                    customer_id: actor.id,
                })
                .await
            {
                warn!(error = %e, booking_id = %booking_id, "failed to send booking created event");
            }
        }

        Ok(detail)
    }

    /// Fetches an enriched booking. Visible to the owning customer
    /// (internal notes redacted), the assigned technician and admins.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn get_booking(
        &self,
        actor: &Actor,
        booking_id: Uuid,
    ) -> Result<BookingDetail, ServiceError> {
        let db = &*self.db;
        let booking = BookingEntity::find_by_id(booking_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booking {} not found", booking_id)))?;

        let include_internal = match actor.role {
            Role::Admin => true,
            Role::Technician => {
                if booking.technician_id != Some(actor.id) {
                    return Err(ServiceError::Forbidden(
                        "booking is not assigned to this technician".into(),
                    ));
                }
                true
            }
            Role::Client => {
                if booking.customer_id != actor.id {
                    return Err(ServiceError::Forbidden(
                        "booking belongs to another customer".into(),
                    ));
                }
                false
            }
        };

        load_detail(db, booking, include_internal).await
    }

    /// Paginated listing scoped to the caller: admins see everything,
    /// customers their own bookings, technicians their assigned jobs.
    #[instrument(skip(self))]
    pub async fn list_bookings(
        &self,
        actor: &Actor,
        page: u64,
        per_page: u64,
    ) -> Result<BookingListResponse, ServiceError> {
        let db = &*self.db;
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);

        let mut query = BookingEntity::find().order_by_desc(booking::Column::CreatedAt);
        match actor.role {
            Role::Admin => {}
            Role::Client => {
                query = query.filter(booking::Column::CustomerId.eq(actor.id));
            }
            Role::Technician => {
                query = query.filter(booking::Column::TechnicianId.eq(actor.id));
            }
        }

        let paginator = query.paginate(db, per_page);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;

        let include_internal = actor.role != Role::Client;
        let bookings = models
            .into_iter()
            .map(|m| BookingResponse::from_model(m, include_internal))
            .collect();

        Ok(BookingListResponse {
            bookings,
            total,
            page,
            per_page,
        })
    }

    /// Resolves a human-readable booking number to its id.
    pub async fn find_booking_id_by_number(
        &self,
        booking_number: &str,
    ) -> Result<Option<Uuid>, ServiceError> {
        let found = BookingEntity::find()
            .filter(booking::Column::BookingNumber.eq(booking_number))
            .one(&*self.db)
            .await?;
        Ok(found.map(|b| b.id))
    }
}
