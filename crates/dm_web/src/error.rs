use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dm_core::Error;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Route-level wrapper turning crate errors into JSON responses.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
            Error::CrawlInProgress => StatusCode::CONFLICT,
            Error::Normalization(_) | Error::Config(_) | Error::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError(Error::NotConnected).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError(Error::CrawlInProgress).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError(Error::Config("x".into())).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(Error::Storage("x".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
