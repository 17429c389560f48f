use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post-completion customer feedback, one-to-one with a booking.
///
/// Created unpublished; an admin flips `published` through moderation.
/// `technician_id` and `service_id` are denormalized from the booking at
/// creation so published-only aggregate scans need no join. After creation
/// only `published`, `moderation_notes` and `helpful` are mutable.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub technician_id: Uuid,
    pub service_id: Uuid,

    /// Ratings are 1..=5 inclusive.
    pub overall_rating: i16,
    pub quality_rating: i16,
    pub punctuality_rating: i16,
    pub professionalism_rating: i16,
    pub value_rating: i16,

    pub comment: Option<String>,
    pub positives: Option<String>,
    pub improvements: Option<String>,

    pub published: bool,
    pub moderation_notes: Option<String>,
    pub helpful: i32,
    /// Always true in this flow: reviews attach only to completed bookings
    /// owned by the reviewing customer.
    pub verified_job: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::booking::Entity",
        from = "Column::BookingId",
        to = "super::booking::Column::Id"
    )]
    Booking,
    #[sea_orm(
        belongs_to = "super::technician::Entity",
        from = "Column::TechnicianId",
        to = "super::technician::Column::Id"
    )]
    Technician,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl Related<super::technician::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Technician.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
