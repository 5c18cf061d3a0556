use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use voltio_engine::{traits::ExchangeRateError, OrderFlowError};
use thiserror::Error;

/// Server-level errors. Every non-2xx response carries a machine-readable
/// `code` alongside the human message, so UIs can distinguish "not permitted"
/// from "bad input" from "refetch and retry" without parsing prose.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("No access token was provided")]
    MissingAuthToken,
    #[error("Access token invalid: {0}")]
    InvalidAuthToken(String),
    #[error("Insufficient permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The operation conflicts with the current state. {0}")]
    Conflict(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("No exchange rate is available")]
    RateUnavailable,
    #[error("The upstream rate source failed: {0}")]
    UpstreamError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ServerError {
    /// The machine-readable reason carried on every error response.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequestBody(_) | Self::Validation(_) => "validation",
            Self::MissingAuthToken | Self::InvalidAuthToken(_) => "unauthorized",
            Self::InsufficientPermissions(_) => "forbidden",
            Self::NoRecordFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::RateUnavailable => "rate_unavailable",
            Self::UpstreamError(_) => "upstream",
            Self::InitializeError(_) | Self::BackendError(_) | Self::IOError(_) | Self::Unspecified(_) => {
                "backend"
            },
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::MissingAuthToken | Self::InvalidAuthToken(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateUnavailable => StatusCode::NOT_FOUND,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) | Self::BackendError(_) | Self::IOError(_) | Self::Unspecified(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(
            serde_json::json!({ "error": { "code": self.code(), "message": self.to_string() } })
                .to_string(),
        )
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(_) => Self::BackendError(e.to_string()),
            OrderFlowError::OrderNotFound(_)
            | OrderFlowError::ItemNotFound(_)
            | OrderFlowError::ProductNotAvailable(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::NoDraftOrder
            | OrderFlowError::EmptyOrder
            | OrderFlowError::Snapshot(_)
            | OrderFlowError::Validation(_) => Self::Validation(e.to_string()),
            OrderFlowError::Conflict { .. } | OrderFlowError::TransitionForbidden { .. } => {
                Self::Conflict(e.to_string())
            },
            OrderFlowError::Unauthorized(_) => Self::InsufficientPermissions(e.to_string()),
        }
    }
}

impl From<ExchangeRateError> for ServerError {
    fn from(e: ExchangeRateError) -> Self {
        match e {
            ExchangeRateError::DatabaseError(_) => Self::BackendError(e.to_string()),
            ExchangeRateError::RateDoesNotExist(_) => Self::RateUnavailable,
        }
    }
}
