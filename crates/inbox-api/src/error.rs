use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inbox_persist::PersistError;
use inbox_webhooks::WebhookError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("API endpoint not yet implemented.")]
    NotImplemented,

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Webhook server error: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            ApiError::Persist(e) => match e {
                PersistError::NamespaceNotFound(_)
                | PersistError::ThreadNotFound(_)
                | PersistError::MessageNotFound(_)
                | PersistError::DraftNotFound(_)
                | PersistError::WebhookNotFound(_)
                | PersistError::InvalidStamp(_) => StatusCode::NOT_FOUND,
                PersistError::TagNameUnavailable(_) | PersistError::DraftConflict { .. } => {
                    StatusCode::CONFLICT
                }
                PersistError::NotADraft(_) | PersistError::InvalidFilter(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Webhook(e) if e.is_remote() => StatusCode::BAD_REQUEST,
            ApiError::Webhook(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; internal details only go to the log
    fn public_message(&self) -> String {
        match self {
            ApiError::Persist(e) => match e {
                PersistError::NamespaceNotFound(id) => {
                    format!("Couldn't find namespace with id `{}` ", id)
                }
                PersistError::ThreadNotFound(id) => format!("Couldn't find thread with id `{}` ", id),
                PersistError::MessageNotFound(id) => format!("Couldn't find message with id {}", id),
                PersistError::DraftNotFound(id) => format!("No draft found with public_id {}", id),
                PersistError::WebhookNotFound(id) => format!("Couldn't find webhook with id {}", id),
                PersistError::InvalidStamp(_) => "Invalid stamp parameter".to_string(),
                PersistError::TagNameUnavailable(_) => "Tag name not available".to_string(),
                PersistError::InvalidFilter(msg) => msg.clone(),
                PersistError::DraftConflict { .. } | PersistError::NotADraft(_) => e.to_string(),
                _ => "Internal server error".to_string(),
            },
            ApiError::Webhook(e) if e.is_remote() => "Malformed webhook request".to_string(),
            ApiError::Webhook(_) | ApiError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "message": self.public_message(),
            "type": "api_error",
        }));

        (status, body).into_response()
    }
}

/// Extractor rejections answer with the envelope like every other 400
macro_rules! rejection_into_bad_request {
    ($($rejection:ty),*) => {
        $(
            impl From<$rejection> for ApiError {
                fn from(rejection: $rejection) -> Self {
                    ApiError::BadRequest(rejection.body_text())
                }
            }
        )*
    };
}

rejection_into_bad_request!(PathRejection, QueryRejection, MultipartRejection);

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_errors_map_to_statuses() {
        let cases = [
            (PersistError::ThreadNotFound("t".into()), StatusCode::NOT_FOUND),
            (PersistError::TagNameUnavailable("x".into()), StatusCode::CONFLICT),
            (PersistError::NotADraft("d".into()), StatusCode::BAD_REQUEST),
            (PersistError::InvalidStamp("s".into()), StatusCode::NOT_FOUND),
            (PersistError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_webhook_rejection_is_bad_request() {
        let err = ApiError::from(WebhookError::Remote("bad callback".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Malformed webhook request");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::Persist(PersistError::Connection("mongodb://secret".into()));
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(ApiError::NotImplemented.public_message(), "API endpoint not yet implemented.");
    }
}
