//! Authentication and authorization.
//!
//! Handlers authenticate callers through HS256 bearer tokens; the lifecycle
//! core consumes only an [`Actor`] (id + closed [`Role`] enum). Role legality
//! for every lifecycle operation is decided by the single [`policy`] table
//! rather than ad-hoc checks scattered across handlers.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::AppState;

/// Caller role. Closed set with exhaustive matching everywhere downstream.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Client,
    Technician,
    Admin,
}

/// Authenticated caller identity handed to the lifecycle core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }
}

/// Lifecycle operations subject to role gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateBooking,
    ConfirmBooking,
    AssignTechnician,
    StartJob,
    CompleteJob,
    CancelBooking,
    SubmitReview,
    ModerateReview,
}

pub mod policy {
    use super::{Operation, Role};

    /// Single authorization table keyed by (role, operation).
    ///
    /// Ownership constraints (owning customer, assigned technician) are
    /// checked by the services against the loaded row; this table answers
    /// only whether the role may attempt the operation at all.
    pub fn allows(role: Role, op: Operation) -> bool {
        match (role, op) {
            (Role::Client, Operation::CreateBooking) => true,
            (Role::Client, Operation::CancelBooking) => true,
            (Role::Client, Operation::SubmitReview) => true,
            (Role::Client, _) => false,

            (Role::Technician, Operation::StartJob) => true,
            (Role::Technician, Operation::CompleteJob) => true,
            (Role::Technician, _) => false,

            (Role::Admin, Operation::ConfirmBooking) => true,
            (Role::Admin, Operation::AssignTechnician) => true,
            (Role::Admin, Operation::CancelBooking) => true,
            (Role::Admin, Operation::ModerateReview) => true,
            (Role::Admin, _) => false,
        }
    }
}

/// JWT claim set carried by bearer tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (caller id, UUID)
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues an HS256 bearer token for a caller. Used by the out-of-scope
/// sign-in surface and by test fixtures.
pub fn issue_token(
    secret: &str,
    actor: &Actor,
    ttl_secs: i64,
) -> Result<String, ServiceError> {
    let now = Utc::now();
    let claims = Claims {
        sub: actor.id.to_string(),
        role: actor.role,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::InternalError(format!("failed to sign token: {e}")))
}

/// Decodes and validates a bearer token into an [`Actor`].
pub fn decode_token(secret: &str, token: &str) -> Result<Actor, ServiceError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {e}")))?;

    let id = Uuid::parse_str(&data.claims.sub)
        .map_err(|_| ServiceError::Unauthorized("token subject is not a UUID".into()))?;
    Ok(Actor::new(id, data.claims.role))
}

/// Authenticated caller extracted from the Authorization header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("missing Authorization header".into()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::Unauthorized("expected Bearer token".into()))?;

        let actor = decode_token(&state.config.jwt_secret, token)?;
        Ok(AuthUser(actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let actor = Actor::new(Uuid::new_v4(), Role::Technician);
        let token = issue_token("test-secret", &actor, 3600).unwrap();
        let decoded = decode_token("test-secret", &token).unwrap();
        assert_eq!(decoded, actor);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let actor = Actor::new(Uuid::new_v4(), Role::Admin);
        let token = issue_token("secret-a", &actor, 3600).unwrap();
        assert!(decode_token("secret-b", &token).is_err());
    }

    #[test]
    fn policy_gates_assignment_to_admins() {
        assert!(policy::allows(Role::Admin, Operation::AssignTechnician));
        assert!(!policy::allows(Role::Client, Operation::AssignTechnician));
        assert!(!policy::allows(Role::Technician, Operation::AssignTechnician));
    }

    #[test]
    fn policy_gates_job_execution_to_technicians() {
        for op in [Operation::StartJob, Operation::CompleteJob] {
            assert!(policy::allows(Role::Technician, op));
            assert!(!policy::allows(Role::Client, op));
            assert!(!policy::allows(Role::Admin, op));
        }
    }

    #[test]
    fn policy_allows_cancel_for_admin_and_client_only() {
        assert!(policy::allows(Role::Admin, Operation::CancelBooking));
        assert!(policy::allows(Role::Client, Operation::CancelBooking));
        assert!(!policy::allows(Role::Technician, Operation::CancelBooking));
    }

    #[test]
    fn role_parses_from_snake_case() {
        use std::str::FromStr;
        assert_eq!(Role::from_str("client").unwrap(), Role::Client);
        assert_eq!(Role::from_str("technician").unwrap(), Role::Technician);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert!(Role::from_str("superuser").is_err());
    }
}
