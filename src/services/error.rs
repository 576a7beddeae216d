//! Error handling utilities for route handlers

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::media::MediaError;

/// Error returned from handlers, rendered as `{"detail": "..."}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::Decode(_) | AnalysisError::InvalidVideo(_) => {
                ApiError::BadRequest(e.to_string())
            }
            AnalysisError::NoFramesAnalyzed => ApiError::Unprocessable(e.to_string()),
            AnalysisError::Io(_) | AnalysisError::Tool(_) | AnalysisError::Worker(_) => {
                ApiError::Internal(format!("Failed to analyze file: {}", e))
            }
        }
    }
}

/// Extension trait for logging errors and converting to ApiError
pub trait LogErr<T> {
    /// Log error with context and return a 500 carrying the context
    fn log_500(self, context: &str) -> Result<T, ApiError>;

    /// Log error with context and return a 400 carrying the context
    fn log_400(self, context: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> LogErr<T> for Result<T, E> {
    fn log_500(self, context: &str) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::error!("{}: {}", context, e);
            ApiError::Internal(format!("{}: {}", context, e))
        })
    }

    fn log_400(self, context: &str) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::warn!("{}: {}", context, e);
            ApiError::BadRequest(format!("{}: {}", context, e))
        })
    }
}
