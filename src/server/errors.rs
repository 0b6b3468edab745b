use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::verification::VerificationError;
use crate::verification::messages::{
    ERROR_UPLOADING_SIGNATURE, ERROR_UPLOADING_SIGNATURE_MESSAGE, INTERNAL_ERROR,
    INTERNAL_ERROR_MESSAGE, SIGNATURE_INVALID_FORMAT, SIGNATURE_INVALID_FORMAT_MESSAGE,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Upload(String),
    #[error(transparent)]
    Verification(#[from] VerificationError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: &'static str,
}

impl AppError {
    /// Status and fixed error code sent to the client.
    pub fn to_error_body(&self) -> (StatusCode, ErrorBody) {
        let (status, code, message) = match self {
            AppError::Upload(_) => (
                StatusCode::BAD_REQUEST,
                ERROR_UPLOADING_SIGNATURE,
                ERROR_UPLOADING_SIGNATURE_MESSAGE,
            ),
            AppError::Verification(VerificationError::Parse(_)) => (
                StatusCode::BAD_REQUEST,
                SIGNATURE_INVALID_FORMAT,
                SIGNATURE_INVALID_FORMAT_MESSAGE,
            ),
            AppError::Verification(VerificationError::Store(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR,
                INTERNAL_ERROR_MESSAGE,
            ),
        };
        (status, ErrorBody { code, message })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_error_body();
        if status.is_server_error() {
            tracing::error!("Service failure: {self}");
        } else {
            tracing::warn!("Rejected request: {self}");
        }
        (status, Json(body)).into_response()
    }
}
