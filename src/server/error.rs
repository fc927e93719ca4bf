//! Error types for the server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::PipelineError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Invalid JSON body: {0}")]
    Json(#[from] JsonRejection),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    fn kind(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) | ServerError::Json(_) => "bad_request",
            ServerError::Pipeline(e) => e.kind(),
            ServerError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::Json(e) => (StatusCode::BAD_REQUEST, e.body_text()),
            ServerError::Pipeline(e) if e.is_internal() => {
                tracing::error!(kind = e.kind(), detail = %e, "Pipeline fault");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Processing failed. Check server logs for details.".to_string(),
                )
            }
            ServerError::Pipeline(e) => {
                tracing::warn!(kind = e.kind(), precondition = e.is_precondition(), "{}", e);
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred".to_string())
            }
        };

        let body = Json(json!({
            "error": true,
            "kind": self.kind(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Operation;

    #[test]
    fn test_status_mapping() {
        let precondition = ServerError::from(PipelineError::NoTarget(Operation::Split));
        assert_eq!(precondition.into_response().status(), StatusCode::BAD_REQUEST);

        let internal = ServerError::from(PipelineError::Processing("boom".to_string()));
        assert_eq!(
            internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let mismatch = ServerError::from(PipelineError::RowCountMismatch { features: 3, target: 2 });
        assert_eq!(
            mismatch.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let joined = ServerError::Internal("pipeline task failed".to_string());
        assert_eq!(joined.kind(), "internal");
        assert_eq!(joined.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
