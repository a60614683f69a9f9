use std::sync::LazyLock;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use restful_core::error::CoreError;
use restful_core::negotiation::{RequestInfo, ResponseFactory, ResponseHead};
use restful_core::resource::{content_type, ErrorEnvelope, Resource};
use restful_core::validation::ValidationError;

use crate::response::render_text;

/// Factory used when an error escapes outside the pipeline (extractor
/// rejections). Always negotiates JSON.
static FALLBACK_FACTORY: LazyLock<ResponseFactory> = LazyLock::new(ResponseFactory::default);

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for negotiation/configuration errors and adds
/// HTTP-specific variants. Every variant becomes an [`ErrorEnvelope`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// An error from `restful_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Declared validation rules failed.
    #[error("{message}")]
    UnprocessableEntity {
        message: String,
        errors: Vec<ValidationError>,
    },

    /// No builder could be negotiated for the requested content type.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// 422 carrying every validation error, titled after the first one.
    pub fn unprocessable_entity(errors: Vec<ValidationError>) -> Self {
        let first = errors
            .first()
            .map(|e| e.message.as_str())
            .unwrap_or("invalid input");
        AppError::UnprocessableEntity {
            message: format!("Validation Failed: {first}"),
            errors,
        }
    }

    /// HTTP status carried by this error.
    pub fn code(&self) -> Option<i64> {
        let status = match self {
            AppError::Core(CoreError::InvalidState(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Core(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Some(i64::from(status.as_u16()))
    }

    /// Message safe to show to clients. Internal details are never exposed.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Core(
                CoreError::InvalidArgument(msg) | CoreError::InvalidState(msg) | CoreError::Mapping(msg),
            ) => msg.clone(),
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::UnsupportedMediaType(msg) => msg.clone(),
            AppError::UnprocessableEntity { message, .. } => message.clone(),
            AppError::InternalError(_) => "An internal error occurred".to_string(),
        }
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            AppError::UnprocessableEntity { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Build the wire envelope and log the failure at a level matching its
    /// class.
    pub fn envelope(&self) -> ErrorEnvelope {
        let envelope = ErrorEnvelope::new(self.code(), self.public_message(), self.errors().to_vec());
        if envelope.code >= 500 {
            tracing::error!(error = %self, code = envelope.code, "Request failed");
        } else {
            tracing::warn!(error = %self, code = envelope.code, "Request rejected");
        }
        envelope
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let envelope = self.envelope();
        let code = envelope.code;
        let resource = Resource::from_envelope(envelope, content_type::JSON);
        let mut head = ResponseHead::default();

        match FALLBACK_FACTORY.create(&resource, Some(code), &RequestInfo::default(), &mut head) {
            Ok(built) => render_text(&head, built),
            Err(err) => {
                tracing::error!(error = %err, "Failed to negotiate error envelope");
                StatusCode::from_u16(code)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                    .into_response()
            }
        }
    }
}
