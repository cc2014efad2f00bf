use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Error returned by every handler, rendered as `{"error": message}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl From<cograph_core::Error> for ApiError {
    fn from(e: cograph_core::Error) -> Self {
        use cograph_core::Error;
        match e {
            Error::UnknownAlgorithm { .. } | Error::InvalidInput(_) | Error::InvalidConfig(_) => {
                ApiError::BadRequest(e.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<cograph_storage::Error> for ApiError {
    fn from(e: cograph_storage::Error) -> Self {
        use cograph_storage::Error;
        match e {
            Error::NotFound(_) => ApiError::NotFound(e.to_string()),
            Error::InvalidPath(_) => ApiError::BadRequest(e.to_string()),
            Error::Core(inner) => inner.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(message) = self {
            tracing::error!(error = %message, "request failed");
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let unknown: ApiError = cograph_core::Error::UnknownAlgorithm {
            kind: "community",
            name: "x".to_string(),
        }
        .into();
        assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);

        let missing: ApiError = cograph_storage::Error::NotFound("a.jsonl".to_string()).into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let nested: ApiError = cograph_storage::Error::Core(cograph_core::Error::InvalidConfig("k".to_string())).into();
        assert_eq!(nested.status_code(), StatusCode::BAD_REQUEST);

        let io: ApiError = cograph_core::Error::Source("disk".to_string()).into();
        assert_eq!(io.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
