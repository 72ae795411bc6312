use http::StatusCode;
use sea_orm::error::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Checkout preconditions that are checked before any write happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precondition {
    /// The user has no cart in the `open` state.
    NoOpenCart,
    /// The open cart exists but holds no items.
    EmptyCart,
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precondition::NoOpenCart => f.write_str("no open cart"),
            Precondition::EmptyCart => f.write_str("cart is empty"),
        }
    }
}

/// Serialisable error body handed to whatever transport sits in front of the core.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(Precondition),

    #[error("Transaction aborted during {operation}: {reason}")]
    TransactionAborted { operation: String, reason: String },

    #[error("Insufficient stock for variant {variant_id}: requested {requested}, on hand {on_hand}")]
    InsufficientStock {
        variant_id: Uuid,
        requested: i32,
        on_hand: i32,
    },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                ServiceError::Conflict(format!("unique constraint violated: {}", detail))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                ServiceError::Conflict(format!("record is still referenced: {}", detail))
            }
            _ => ServiceError::DatabaseError(err),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{} {} not found", kind, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::ValidationError(message.into())
    }

    /// Re-labels a failure raised inside a rolled back multi-step write.
    ///
    /// Store failures become `TransactionAborted`; typed domain errors and
    /// constraint conflicts keep their kind so callers can still react to them.
    pub fn into_aborted(self, operation: &str) -> Self {
        match self {
            ServiceError::DatabaseError(err) => ServiceError::TransactionAborted {
                operation: operation.to_string(),
                reason: err.to_string(),
            },
            other => other,
        }
    }

    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::NotFound(_) => "not_found",
            Self::ValidationError(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::PreconditionFailed(Precondition::NoOpenCart) => "no_open_cart",
            Self::PreconditionFailed(Precondition::EmptyCart) => "empty_cart",
            Self::TransactionAborted { .. } => "transaction_aborted",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::InvalidOperation(_) => "invalid_operation",
            Self::InternalError(_) | Self::Other(_) => "internal_error",
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PreconditionFailed(_) | Self::InsufficientStock { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::DatabaseError(_)
            | Self::TransactionAborted { .. }
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) | Self::TransactionAborted { .. } => {
                "Database error".to_string()
            }
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let status = self.status_code();
        ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            message: self.response_message(),
            code: self.code().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_and_conflict_are_client_errors() {
        assert_eq!(
            ServiceError::validation("duplicate attribute").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Conflict("slug taken".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::PreconditionFailed(Precondition::EmptyCart).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = ServiceError::DatabaseError(DbErr::Custom("relation orders missing".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.response_message(), "Database error");

        let aborted = err.into_aborted("place_order");
        assert!(matches!(aborted, ServiceError::TransactionAborted { .. }));
        assert!(!aborted.response_message().contains("orders"));
    }

    #[test]
    fn into_aborted_keeps_domain_errors() {
        let err = ServiceError::PreconditionFailed(Precondition::NoOpenCart).into_aborted("x");
        assert!(matches!(
            err,
            ServiceError::PreconditionFailed(Precondition::NoOpenCart)
        ));
        assert_eq!(err.code(), "no_open_cart");
    }

    #[test]
    fn custom_db_errors_stay_database_errors() {
        let err: ServiceError = DbErr::Custom("boom".into()).into();
        assert!(matches!(err, ServiceError::DatabaseError(_)));
    }

    #[test]
    fn response_carries_status_reason() {
        let body = ServiceError::not_found("Order", Uuid::nil()).to_response();
        assert_eq!(body.error, "Not Found");
        assert_eq!(body.code, "not_found");
        assert!(body.message.contains("Order"));
    }
}
