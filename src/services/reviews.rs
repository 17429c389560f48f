use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{policy, Actor, Operation},
    db::DbPool,
    entities::{
        booking::{BookingStatus, Entity as BookingEntity},
        review::{self, Entity as ReviewEntity},
        technician::{self, Entity as TechnicianEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

const RATING_RANGE: std::ops::RangeInclusive<i16> = 1..=5;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitReviewRequest {
    pub overall_rating: i16,
    pub quality_rating: i16,
    pub punctuality_rating: i16,
    pub professionalism_rating: i16,
    pub value_rating: i16,
    #[validate(length(max = 2000, message = "Comment is limited to 2000 characters"))]
    pub comment: Option<String>,
    #[validate(length(max = 2000, message = "Positives are limited to 2000 characters"))]
    pub positives: Option<String>,
    #[validate(length(max = 2000, message = "Improvements are limited to 2000 characters"))]
    pub improvements: Option<String>,
}

impl SubmitReviewRequest {
    fn validate_ratings(&self) -> Result<(), ServiceError> {
        let ratings = [
            ("overall_rating", self.overall_rating),
            ("quality_rating", self.quality_rating),
            ("punctuality_rating", self.punctuality_rating),
            ("professionalism_rating", self.professionalism_rating),
            ("value_rating", self.value_rating),
        ];
        for (name, value) in ratings {
            if !RATING_RANGE.contains(&value) {
                return Err(ServiceError::ValidationError(format!(
                    "{} must be between 1 and 5, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModerationAction {
    Approve,
    Deny,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModerateReviewRequest {
    pub action: ModerationAction,
    pub notes: Option<String>,
}

/// Post-completion feedback capture and the moderation gate in front of
/// public visibility. Unpublished reviews never reach any displayed
/// statistic.
#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ReviewService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Creates the single review for a completed booking, unpublished.
    #[instrument(skip(self, request), fields(booking_id = %booking_id, customer_id = %actor.id))]
    pub async fn submit_review(
        &self,
        actor: &Actor,
        booking_id: Uuid,
        request: SubmitReviewRequest,
    ) -> Result<review::Model, ServiceError> {
        if !policy::allows(actor.role, Operation::SubmitReview) {
            return Err(ServiceError::Forbidden(
                "only customers may submit reviews".into(),
            ));
        }
        request.validate()?;
        request.validate_ratings()?;

        let db = &*self.db;
        let now = Utc::now();
        let txn = db.begin().await?;

        let booking = BookingEntity::find_by_id(booking_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booking {} not found", booking_id)))?;

        if booking.customer_id != actor.id {
            return Err(ServiceError::Forbidden(
                "booking belongs to another customer".into(),
            ));
        }
        if booking.status != BookingStatus::Completed {
            return Err(ServiceError::InvalidState(format!(
                "booking {} is '{}', only completed bookings can be reviewed",
                booking_id, booking.status
            )));
        }

        let existing = ReviewEntity::find()
            .filter(review::Column::BookingId.eq(booking_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "booking {} already has a review",
                booking_id
            )));
        }

        // A completed booking always carries its technician.
        let technician_id = booking.technician_id.ok_or_else(|| {
            ServiceError::InternalError("completed booking has no technician".into())
        })?;

        let model = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking_id),
            customer_id: Set(actor.id),
            technician_id: Set(technician_id),
            service_id: Set(booking.service_id),
            overall_rating: Set(request.overall_rating),
            quality_rating: Set(request.quality_rating),
            punctuality_rating: Set(request.punctuality_rating),
            professionalism_rating: Set(request.professionalism_rating),
            value_rating: Set(request.value_rating),
            comment: Set(request.comment),
            positives: Set(request.positives),
            improvements: Set(request.improvements),
            published: Set(false),
            moderation_notes: Set(None),
            helpful: Set(0),
            verified_job: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(review_id = %model.id, booking_id = %booking_id, "review submitted");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::ReviewSubmitted {
                    review_id: model.id,
                    booking_id,
                })
                .await
            {
                warn!(error = %e, review_id = %model.id, "failed to send review submitted event");
            }
        }

        Ok(model)
    }

    /// Approves or denies a review. Approval refreshes the technician's
    /// cached rating from published reviews in the same transaction.
    #[instrument(skip(self, request), fields(review_id = %review_id, admin_id = %actor.id))]
    pub async fn moderate(
        &self,
        actor: &Actor,
        review_id: Uuid,
        request: ModerateReviewRequest,
    ) -> Result<review::Model, ServiceError> {
        if !policy::allows(actor.role, Operation::ModerateReview) {
            return Err(ServiceError::Forbidden(
                "only admins may moderate reviews".into(),
            ));
        }

        let db = &*self.db;
        let now = Utc::now();
        let txn = db.begin().await?;

        let existing = ReviewEntity::find_by_id(review_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Review {} not found", review_id)))?;
        let technician_id = existing.technician_id;

        let published = request.action == ModerationAction::Approve;
        let mut active: review::ActiveModel = existing.into();
        active.published = Set(published);
        active.moderation_notes = Set(request.notes);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        refresh_technician_rating(&txn, technician_id, now).await?;

        txn.commit().await?;

        info!(review_id = %review_id, published, "review moderated");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::ReviewModerated {
                    review_id,
                    published,
                })
                .await
            {
                warn!(error = %e, review_id = %review_id, "failed to send review moderated event");
            }
        }

        Ok(updated)
    }

    /// Increments the helpful counter.
    #[instrument(skip(self), fields(review_id = %review_id))]
    pub async fn mark_helpful(&self, review_id: Uuid) -> Result<review::Model, ServiceError> {
        let db = &*self.db;
        let existing = ReviewEntity::find_by_id(review_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Review {} not found", review_id)))?;

        let helpful = existing.helpful + 1;
        let mut active: review::ActiveModel = existing.into();
        active.helpful = Set(helpful);
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    /// Average overall rating across a technician's published reviews.
    pub async fn technician_rating(
        &self,
        technician_id: Uuid,
    ) -> Result<Option<Decimal>, ServiceError> {
        let reviews = ReviewEntity::find()
            .filter(review::Column::TechnicianId.eq(technician_id))
            .filter(review::Column::Published.eq(true))
            .all(&*self.db)
            .await?;
        Ok(average_overall(&reviews))
    }

    /// Average overall rating across a service's published reviews.
    pub async fn service_rating(&self, service_id: Uuid) -> Result<Option<Decimal>, ServiceError> {
        let reviews = ReviewEntity::find()
            .filter(review::Column::ServiceId.eq(service_id))
            .filter(review::Column::Published.eq(true))
            .all(&*self.db)
            .await?;
        Ok(average_overall(&reviews))
    }

    /// Published reviews for a service, for public display.
    pub async fn published_for_service(
        &self,
        service_id: Uuid,
    ) -> Result<Vec<review::Model>, ServiceError> {
        use sea_orm::QueryOrder;
        Ok(ReviewEntity::find()
            .filter(review::Column::ServiceId.eq(service_id))
            .filter(review::Column::Published.eq(true))
            .order_by_desc(review::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Published reviews for a technician, for public display.
    pub async fn published_for_technician(
        &self,
        technician_id: Uuid,
    ) -> Result<Vec<review::Model>, ServiceError> {
        use sea_orm::QueryOrder;
        Ok(ReviewEntity::find()
            .filter(review::Column::TechnicianId.eq(technician_id))
            .filter(review::Column::Published.eq(true))
            .order_by_desc(review::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }
}

fn average_overall(reviews: &[review::Model]) -> Option<Decimal> {
    if reviews.is_empty() {
        return None;
    }
    let sum: i64 = reviews.iter().map(|r| i64::from(r.overall_rating)).sum();
    Some(Decimal::from(sum) / Decimal::from(reviews.len() as i64))
}

/// Recomputes a technician's cached rating from published reviews only.
async fn refresh_technician_rating<C: ConnectionTrait>(
    conn: &C,
    technician_id: Uuid,
    now: chrono::DateTime<Utc>,
) -> Result<(), ServiceError> {
    let published = ReviewEntity::find()
        .filter(review::Column::TechnicianId.eq(technician_id))
        .filter(review::Column::Published.eq(true))
        .all(conn)
        .await?;
    let rating = average_overall(&published);

    let tech = TechnicianEntity::find_by_id(technician_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Technician {} not found", technician_id))
        })?;
    let mut active: technician::ActiveModel = tech.into();
    active.rating = Set(rating);
    active.updated_at = Set(now);
    active.update(conn).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_with_rating(rating: i16) -> review::Model {
        let now = Utc::now();
        review::Model {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            technician_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            overall_rating: rating,
            quality_rating: rating,
            punctuality_rating: rating,
            professionalism_rating: rating,
            value_rating: rating,
            comment: None,
            positives: None,
            improvements: None,
            published: true,
            moderation_notes: None,
            helpful: 0,
            verified_job: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn average_of_no_reviews_is_none() {
        assert_eq!(average_overall(&[]), None);
    }

    #[test]
    fn average_is_exact_decimal() {
        let reviews = vec![
            review_with_rating(5),
            review_with_rating(4),
            review_with_rating(4),
            review_with_rating(3),
        ];
        assert_eq!(average_overall(&reviews), Some(Decimal::from(4)));
    }

    #[test]
    fn rating_bounds_are_enforced() {
        let mut request = SubmitReviewRequest {
            overall_rating: 5,
            quality_rating: 5,
            punctuality_rating: 5,
            professionalism_rating: 5,
            value_rating: 5,
            comment: None,
            positives: None,
            improvements: None,
        };
        assert!(request.validate_ratings().is_ok());

        request.value_rating = 0;
        assert!(request.validate_ratings().is_err());

        request.value_rating = 6;
        assert!(request.validate_ratings().is_err());
    }
}
