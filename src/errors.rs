use crate::upstream::UpstreamError;
use axum::{http::StatusCode, Json};
use serde::Serialize;
use thiserror::Error;

/// Application errors. `Display` is the text placed in the `/mcp` error envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("Invalid JSON body: {0}")]
    MalformedRequest(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Tool '{0}' not found")]
    ToolNotFound(String),
    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "Unauthorized",
            AppError::MalformedRequest(_) => "MalformedRequest",
            AppError::MissingField(_) => "MissingField",
            AppError::ToolNotFound(_) => "ToolNotFound",
            AppError::InvalidArguments { .. } => "InvalidArguments",
            AppError::Upstream(UpstreamError::MissingApiKey) => "MissingApiKey",
            AppError::Upstream(UpstreamError::UnsupportedMethod(_)) => "UnsupportedMethod",
            AppError::Upstream(UpstreamError::Transport(_)) => "Transport",
            AppError::Upstream(UpstreamError::Status { .. }) => "UpstreamStatus",
            AppError::Upstream(UpstreamError::InvalidJson(_)) => "UpstreamInvalidJson",
        }
    }

    /// Status for errors answered outside the envelope. Tool-call failures are
    /// always reported with 200 inside the envelope instead.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::OK,
        }
    }

    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            AppError::Upstream(UpstreamError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }

    pub fn invalid_arguments(tool: &str, reason: impl ToString) -> Self {
        AppError::InvalidArguments { tool: tool.to_string(), reason: reason.to_string() }
    }
}

pub fn into_response(err: AppError) -> (StatusCode, Json<ErrorBody>) {
    let code = err.code();
    let message = err.to_string();
    (err.status(), Json(ErrorBody { code, message }))
}
