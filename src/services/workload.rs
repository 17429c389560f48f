//! Per-technician workload counters.
//!
//! These functions are invoked only by the status transition engine and the
//! assignment coordinator, always against the caller's open transaction so
//! counter writes commit atomically with the status write they accompany.
//! Handlers never call them directly.
//!
//! All updates are expressed as in-database arithmetic rather than
//! read-modify-write, so two transactions adjusting the same technician
//! under read-committed isolation cannot lose an increment.

use chrono::Utc;
use sea_orm::{sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::warn;
use uuid::Uuid;

use crate::entities::technician::{self, Entity as TechnicianEntity};
use crate::errors::ServiceError;

/// A booking entered `assigned` for this technician.
pub async fn on_assigned<C: ConnectionTrait>(
    conn: &C,
    technician_id: Uuid,
) -> Result<(), ServiceError> {
    let result = TechnicianEntity::update_many()
        .col_expr(
            technician::Column::AssignedJobs,
            Expr::col(technician::Column::AssignedJobs).add(1),
        )
        .col_expr(technician::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(technician::Column::Id.eq(technician_id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!(
            "Technician {} not found",
            technician_id
        )));
    }
    Ok(())
}

/// A booking this technician was working entered `completed`.
pub async fn on_completed<C: ConnectionTrait>(
    conn: &C,
    technician_id: Uuid,
) -> Result<(), ServiceError> {
    let result = TechnicianEntity::update_many()
        .col_expr(
            technician::Column::AssignedJobs,
            Expr::col(technician::Column::AssignedJobs).sub(1),
        )
        .col_expr(
            technician::Column::CompletedJobs,
            Expr::col(technician::Column::CompletedJobs).add(1),
        )
        .col_expr(technician::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(technician::Column::Id.eq(technician_id))
        .filter(technician::Column::AssignedJobs.gt(0))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        // Counter already at zero (or unknown technician): still record the
        // completion, never go negative.
        warn!(technician_id = %technician_id, "assigned_jobs counter already zero on completion");
        let fallback = TechnicianEntity::update_many()
            .col_expr(
                technician::Column::CompletedJobs,
                Expr::col(technician::Column::CompletedJobs).add(1),
            )
            .col_expr(technician::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(technician::Column::Id.eq(technician_id))
            .exec(conn)
            .await?;
        if fallback.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Technician {} not found",
                technician_id
            )));
        }
    }
    Ok(())
}

/// A booking this technician was assigned to was cancelled before
/// completion. Keeps `assigned_jobs` equal to the technician's live load.
pub async fn on_cancelled<C: ConnectionTrait>(
    conn: &C,
    technician_id: Uuid,
) -> Result<(), ServiceError> {
    let result = TechnicianEntity::update_many()
        .col_expr(
            technician::Column::AssignedJobs,
            Expr::col(technician::Column::AssignedJobs).sub(1),
        )
        .col_expr(technician::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(technician::Column::Id.eq(technician_id))
        .filter(technician::Column::AssignedJobs.gt(0))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        let exists = TechnicianEntity::find_by_id(technician_id)
            .one(conn)
            .await?
            .is_some();
        if !exists {
            return Err(ServiceError::NotFound(format!(
                "Technician {} not found",
                technician_id
            )));
        }
        warn!(technician_id = %technician_id, "assigned_jobs counter already zero on cancellation");
    }
    Ok(())
}
