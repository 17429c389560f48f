use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the fixed price table for a service. `base_amount` is in
/// integer minor currency units; booking creation resolves the option
/// through this table and fails loudly on an unknown key.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pricing_options")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub service_id: Uuid,
    pub name: String,
    pub base_amount: i64,
    pub duration_minutes: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_offering::Entity",
        from = "Column::ServiceId",
        to = "super::service_offering::Column::Id"
    )]
    ServiceOffering,
}

impl Related<super::service_offering::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceOffering.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
