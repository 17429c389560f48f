use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operational status of a technician. Only `active` technicians are
/// accepted by the assignment coordinator.
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
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TechnicianStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "suspended")]
    Suspended,
    #[sea_orm(string_value = "under_review")]
    UnderReview,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "technicians")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: TechnicianStatus,

    /// Comma-separated specialty tokens, matched case-insensitively against
    /// a service's category and name during assignment.
    pub specialties: String,

    /// Count of bookings currently in `assigned`/`in_progress` for this
    /// technician. Maintained by `services::workload` inside the same
    /// transaction as the status write it accompanies.
    pub assigned_jobs: i32,
    pub completed_jobs: i32,

    /// Cached average of published review ratings; refreshed by the review
    /// subsystem on moderation.
    pub rating: Option<Decimal>,
    /// Admin-assigned quality score, managed outside the lifecycle core.
    pub admin_rating: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Case-insensitive membership check against the declared specialties.
    pub fn has_specialty(&self, token: &str) -> bool {
        let token = token.trim().to_ascii_lowercase();
        self.specialties
            .split(',')
            .map(|s| s.trim().to_ascii_lowercase())
            .any(|s| !s.is_empty() && s == token)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::job_assignment::Entity")]
    JobAssignments,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::job_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobAssignments.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn technician(specialties: &str) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "Test Tech".into(),
            phone: None,
            email: None,
            status: TechnicianStatus::Active,
            specialties: specialties.into(),
            assigned_jobs: 0,
            completed_jobs: 0,
            rating: None,
            admin_rating: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn specialty_matching_is_case_insensitive() {
        let tech = technician("Plumbing, electrical , HVAC");
        assert!(tech.has_specialty("plumbing"));
        assert!(tech.has_specialty("ELECTRICAL"));
        assert!(tech.has_specialty(" hvac "));
        assert!(!tech.has_specialty("painting"));
    }

    #[test]
    fn empty_specialties_match_nothing() {
        let tech = technician("");
        assert!(!tech.has_specialty("plumbing"));
        assert!(!tech.has_specialty(""));
    }
}
