use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use crate::domain::search::{FilterDiagnostics, SearchError, SearchStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingQuery,
    InvalidDistanceMethod,
    InvalidFilter,
    InvalidRequestBody,
    PayloadTooLarge,
    QueryEngineFailure,
    UnexpectedFailure,
    NotFound,
    MethodNotAllowed,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug_info: Option<DebugInfo>,
}

#[derive(Debug, Clone, Serialize)]
struct DebugInfo {
    stage: SearchStage,
    #[serde(flatten)]
    filters: FilterDiagnostics,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: ErrorCode,
    details: Option<String>,
    debug_info: Option<DebugInfo>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            details: None,
            debug_info: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn bad_request(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::UnexpectedFailure,
            message,
        )
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, "Not found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::MethodNotAllowed,
            "Method not allowed",
        )
    }

    /// Drop server-side details from 5xx errors unless `expose` is set.
    pub fn redacted(mut self, expose: bool) -> Self {
        if self.status.is_server_error() && !expose {
            self.details = None;
            self.debug_info = None;
        }
        self
    }

    #[allow(dead_code)]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[allow(dead_code)]
    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            code: self.code,
            details: self.details,
            debug_info: self.debug_info,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        let status = rejection.status();
        let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
            ErrorCode::PayloadTooLarge
        } else {
            ErrorCode::InvalidRequestBody
        };
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        Self::new(status, code, "Failed to read request body").with_details(rejection.body_text())
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::MissingQuery => {
                Self::bad_request(ErrorCode::MissingQuery, err.to_string())
            }
            SearchError::InvalidDistanceMethod(_) => {
                Self::bad_request(ErrorCode::InvalidDistanceMethod, err.to_string())
            }
            SearchError::InvalidFilter(ref e) => {
                let details = e.to_string();
                Self::bad_request(ErrorCode::InvalidFilter, err.to_string()).with_details(details)
            }
            SearchError::CollaboratorFailure {
                stage,
                message,
                diagnostics,
            } => {
                tracing::error!(%stage, filters = ?diagnostics, "Search failed: {}", message);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Search failed".to_string(),
                    code: ErrorCode::QueryEngineFailure,
                    details: Some(message),
                    debug_info: Some(DebugInfo {
                        stage,
                        filters: *diagnostics,
                    }),
                }
            }
            SearchError::EmbeddingError(_) | SearchError::QueryEngineError(_) => {
                tracing::error!("Search failed: {}", err);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::QueryEngineFailure,
                    "Search failed",
                )
                .with_details(err.to_string())
            }
            SearchError::ConfigError(_) => {
                tracing::error!("Unexpected search error: {}", err);
                Self::internal("Internal server error").with_details(err.to_string())
            }
        }
    }
}
