//! Error taxonomy shared by every endpoint.
//!
//! Whatever fails inside a request ends up as exactly one [`ApiError`], whose
//! [`ErrorKind`] fixes the HTTP status code and the category reported to the
//! client.

use std::error::Error as StdError;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::pipeline::OperationError;
use crate::store::StoreError;
use crate::validation::ValidationErrors;

type Cause = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input shape
    InvalidRequest,
    /// Well-formed input that breaks a declared rule
    UnprocessablePayload,
    NotFound,
    Conflict,
    Unauthorized,
    /// Unexpected lower-layer failure
    InternalFailure,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::UnprocessablePayload => 422,
            ErrorKind::InternalFailure => 500,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "Bad Request Error",
            ErrorKind::UnprocessablePayload => "Unprocessable Entity Error",
            ErrorKind::NotFound => "Not Found Error",
            ErrorKind::Conflict => "Conflict Error",
            ErrorKind::Unauthorized => "Unauthorized Error",
            ErrorKind::InternalFailure => "Internal Server Error",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{}: {cause}", .kind.label())]
pub struct ApiError {
    kind: ErrorKind,
    #[source]
    cause: Cause,
    details: Vec<String>,
    issued_at: DateTime<Utc>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, cause: impl Into<Cause>) -> Self {
        Self {
            kind,
            cause: cause.into(),
            details: Vec::new(),
            issued_at: Utc::now(),
        }
    }

    pub fn invalid_request(cause: impl Into<Cause>) -> Self {
        Self::new(ErrorKind::InvalidRequest, cause)
    }

    pub fn unprocessable(errors: ValidationErrors) -> Self {
        let details = errors.messages();
        Self {
            details,
            ..Self::new(ErrorKind::UnprocessablePayload, errors)
        }
    }

    pub fn not_found(cause: impl Into<Cause>) -> Self {
        Self::new(ErrorKind::NotFound, cause)
    }

    pub fn conflict(cause: impl Into<Cause>) -> Self {
        Self::new(ErrorKind::Conflict, cause)
    }

    pub fn unauthorized(cause: impl Into<Cause>) -> Self {
        Self::new(ErrorKind::Unauthorized, cause)
    }

    pub fn internal(cause: impl Into<Cause>) -> Self {
        Self::new(ErrorKind::InternalFailure, cause)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Validation messages, empty unless the payload was unprocessable.
    pub fn details(&self) -> &[String] {
        &self.details
    }

    /// The operation failure behind an `InternalFailure`, if that is what it wraps.
    pub fn operation_error(&self) -> Option<&OperationError> {
        self.cause.downcast_ref::<OperationError>()
    }

    /// Surface "nothing matched" from a lookup, upsert or delete as `NotFound`.
    pub fn not_found_on_miss(self) -> Self {
        let missed = matches!(
            self.operation_error(),
            Some(OperationError::NotFound(_) | OperationError::NoMatch(_))
        );
        if missed {
            self.reclassify(ErrorKind::NotFound)
        } else {
            self
        }
    }

    /// Surface a storage uniqueness violation as `Conflict`.
    pub fn conflict_on_duplicate(self) -> Self {
        let duplicate = matches!(
            self.operation_error(),
            Some(OperationError::Store(StoreError::DuplicateKey(_)))
        );
        if duplicate {
            self.reclassify(ErrorKind::Conflict)
        } else {
            self
        }
    }

    fn reclassify(self, kind: ErrorKind) -> Self {
        Self { kind, ..self }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.kind.status_code(),
            category: self.kind,
            message: self.kind.label().to_string(),
            error: self.cause.to_string(),
            issued_at: self.issued_at,
            errors: self.details.clone(),
        }
    }
}

/// Error body returned by every endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub category: ErrorKind,
    pub message: String,
    pub error: String,
    pub issued_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[cfg(feature = "http-response")]
impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.kind.status_code())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        (status, axum::Json(self.to_response())).into_response()
    }
}
