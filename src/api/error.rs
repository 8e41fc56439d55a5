use crate::api::envelope::ErrorEnvelope;
use crate::services::upscaler::UpscaleError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Fixed message for requests without a usable `image` field.
pub const MISSING_IMAGE_MESSAGE: &str =
    "Request body must be multipart/form-data with an 'image' field.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Session(String),

    #[error("{0}")]
    Upload(String),

    #[error("{0}")]
    Process(String),

    #[error("{0}")]
    Timeout(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn missing_image() -> Self {
        AppError::Validation(MISSING_IMAGE_MESSAGE.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Session(_) | AppError::Upload(_) => StatusCode::BAD_GATEWAY,
            AppError::Process(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<UpscaleError> for AppError {
    fn from(err: UpscaleError) -> Self {
        let message = err.to_string();
        match err {
            UpscaleError::Session(_) => AppError::Session(message),
            UpscaleError::Upload(_) => AppError::Upload(message),
            UpscaleError::Process(_) => AppError::Process(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::Session(msg)
            | AppError::Upload(msg)
            | AppError::Process(msg)
            | AppError::Timeout(msg) => {
                tracing::error!("Upscale Error: {}", msg);
                msg
            }
            AppError::Validation(msg)
            | AppError::BadRequest(msg)
            | AppError::PayloadTooLarge(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                msg
            }
        };

        (status, Json(ErrorEnvelope::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_upscale_errors_keep_their_kind() {
        let err: AppError = UpscaleError::Session("no token".into()).into();
        assert!(matches!(err, AppError::Session(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err: AppError = UpscaleError::Upload("no server_filename".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err: AppError = UpscaleError::Process("status TaskError".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("Processing failed"));
    }

    #[tokio::test]
    async fn test_missing_image_envelope() {
        let response = AppError::missing_image().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["status"], false);
        assert_eq!(json["creator"], crate::api::CREATOR);
        assert_eq!(json["error"], MISSING_IMAGE_MESSAGE);
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = AppError::Internal("disk on fire".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Internal Server Error");
    }
}
