use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::state::state_machine::InvalidTransition;

/// Errors that can occur in session and service layer operations.
///
/// Every variant is recoverable and reported back to the invoking player; no
/// session state changes on any error path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// A session already exists for the scope.
    #[error("scope conflict: {0}")]
    ScopeConflict(String),
    /// Session or player does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation is not allowed in the current session status.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    /// A host-only operation was invoked by someone else.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),
    /// Join or start rejected by roster limits.
    #[error("roster constraint violation: {0}")]
    RosterConstraintViolation(String),
    /// Wrong ability, already used, or blocked by Lock.
    #[error("ability violation: {0}")]
    AbilityViolation(String),
    /// A required ability argument is missing.
    #[error("argument missing: {0}")]
    ArgumentMissing(String),
}

impl ServiceError {
    /// Stable snake_case identifier of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::ScopeConflict(_) => "scope_conflict",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::InvalidTransition(_) => "invalid_transition",
            ServiceError::AuthorizationDenied(_) => "authorization_denied",
            ServiceError::RosterConstraintViolation(_) => "roster_constraint_violation",
            ServiceError::AbilityViolation(_) => "ability_violation",
            ServiceError::ArgumentMissing(_) => "argument_missing",
        }
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidTransition(format!(
            "{:?} cannot be applied while {:?}",
            err.event, err.from
        ))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid or incomplete input.
    #[error("{message}")]
    BadRequest {
        /// Error kind identifier.
        kind: &'static str,
        /// Human readable detail.
        message: String,
    },
    /// Caller is not allowed to perform the operation.
    #[error("{message}")]
    Forbidden {
        /// Error kind identifier.
        kind: &'static str,
        /// Human readable detail.
        message: String,
    },
    /// Requested resource not found.
    #[error("{message}")]
    NotFound {
        /// Error kind identifier.
        kind: &'static str,
        /// Human readable detail.
        message: String,
    },
    /// Conflict with current state.
    #[error("{message}")]
    Conflict {
        /// Error kind identifier.
        kind: &'static str,
        /// Human readable detail.
        message: String,
    },
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        match err {
            ServiceError::NotFound(_) => AppError::NotFound { kind, message },
            ServiceError::AuthorizationDenied(_) => AppError::Forbidden { kind, message },
            ServiceError::ArgumentMissing(_) => AppError::BadRequest { kind, message },
            ServiceError::ScopeConflict(_)
            | ServiceError::InvalidTransition(_)
            | ServiceError::RosterConstraintViolation(_)
            | ServiceError::AbilityViolation(_) => AppError::Conflict { kind, message },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind) = match &self {
            AppError::BadRequest { kind, .. } => (StatusCode::BAD_REQUEST, *kind),
            AppError::Forbidden { kind, .. } => (StatusCode::FORBIDDEN, *kind),
            AppError::NotFound { kind, .. } => (StatusCode::NOT_FOUND, *kind),
            AppError::Conflict { kind, .. } => (StatusCode::CONFLICT, *kind),
        };

        let payload = Json(ErrorBody {
            kind,
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state_machine::{GameEvent, GamePhase};

    #[test]
    fn service_errors_map_to_http_classes() {
        let cases = [
            (
                ServiceError::ScopeConflict("x".into()),
                StatusCode::CONFLICT,
            ),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                ServiceError::AuthorizationDenied("x".into()),
                StatusCode::FORBIDDEN,
            ),
            (
                ServiceError::ArgumentMissing("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::AbilityViolation("x".into()),
                StatusCode::CONFLICT,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn invalid_transition_converts_to_service_error() {
        let err: ServiceError = InvalidTransition {
            from: GamePhase::Finished,
            event: GameEvent::NextRound,
        }
        .into();
        assert_eq!(err.kind(), "invalid_transition");
    }
}
