use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a booking.
///
/// `pending` is the initial state; `completed`, `cancelled` and `refunded`
/// are terminal. All writes to this column go through
/// `services::booking_status` or `services::assignments`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "assigned")]
    Assigned,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

impl BookingStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Refunded)
    }
}

/// Fixed catalog of schedulable time windows.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeSlot {
    #[sea_orm(string_value = "morning")]
    Morning,
    #[sea_orm(string_value = "afternoon")]
    Afternoon,
    #[sea_orm(string_value = "evening")]
    Evening,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-readable sequential reference, e.g. `BK-000042`.
    pub booking_number: String,

    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub pricing_option_id: Option<Uuid>,
    pub address_id: Uuid,
    /// Set exactly once by the assignment coordinator. Retained for audit
    /// when a booking is cancelled after assignment.
    pub technician_id: Option<Uuid>,
    /// Opaque reference into the external payment collaborator.
    pub payment_id: Option<Uuid>,

    pub status: BookingStatus,
    pub scheduled_date: NaiveDate,
    pub time_slot: TimeSlot,

    /// Minor currency units (e.g. fils). Set from the pricing catalog at
    /// creation and retained even after `final_price` is recorded.
    pub estimated_price: i64,
    pub final_price: Option<i64>,
    pub is_emergency: bool,

    /// Customer-supplied free text.
    pub notes: Option<String>,
    /// Technician/admin notes, appended-to on transitions, never shown to
    /// the customer.
    pub internal_notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly once, on entry to `completed`.
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_offering::Entity",
        from = "Column::ServiceId",
        to = "super::service_offering::Column::Id"
    )]
    ServiceOffering,
    #[sea_orm(
        belongs_to = "super::technician::Entity",
        from = "Column::TechnicianId",
        to = "super::technician::Column::Id"
    )]
    Technician,
    #[sea_orm(
        belongs_to = "super::address::Entity",
        from = "Column::AddressId",
        to = "super::address::Column::Id"
    )]
    Address,
    #[sea_orm(has_one = "super::booking_contact::Entity")]
    Contact,
    #[sea_orm(has_many = "super::job_assignment::Entity")]
    JobAssignments,
    #[sea_orm(has_one = "super::review::Entity")]
    Review,
}

impl Related<super::service_offering::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceOffering.def()
    }
}

impl Related<super::technician::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Technician.def()
    }
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Address.def()
    }
}

impl Related<super::booking_contact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contact.def()
    }
}

impl Related<super::job_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobAssignments.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Assigned,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::Refunded,
        ] {
            let token = status.to_string();
            assert_eq!(BookingStatus::from_str(&token).unwrap(), status);
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Refunded.is_terminal());
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Assigned.is_terminal());
        assert!(!BookingStatus::InProgress.is_terminal());
    }
}
