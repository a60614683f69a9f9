//! Conversion of negotiated responses into axum responses.
//!
//! The core produces a [`ResponseHead`] (status + headers) and an
//! [`ApiResponse`] (content type + body); this module turns the pair into an
//! HTTP response, streaming file bodies from disk.

use std::io::ErrorKind;

use axum::body::Body;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use restful_core::negotiation::{ApiResponse, ResponseBody, ResponseHead};
use restful_core::resource::content_type;
use tokio_util::io::ReaderStream;

use crate::error::AppError;

/// Render any response, reading file bodies from disk.
pub async fn render(head: &ResponseHead, built: ApiResponse) -> Result<Response, AppError> {
    let (path, name) = match built.body {
        ResponseBody::File { path, name } => (path, name),
        body => {
            return Ok(render_text(
                head,
                ApiResponse {
                    content_type: built.content_type,
                    body,
                },
            ))
        }
    };

    let file = tokio::fs::File::open(&path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::NotFound(format!("File {} does not exist", path.display())),
        _ => AppError::InternalError(format!("Cannot read {}: {e}", path.display())),
    })?;
    let file_size = file
        .metadata()
        .await
        .map_err(|e| AppError::InternalError(format!("Cannot stat {}: {e}", path.display())))?
        .len();

    let body = Body::from_stream(ReaderStream::new(file));
    let mut response = base_response(head, &built.content_type, body);
    if response.status() != StatusCode::NO_CONTENT && response.status() != StatusCode::NOT_MODIFIED {
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(file_size));
    }
    if let Some(name) = name {
        let disposition = format!("attachment; filename=\"{}\"", name.replace('"', ""));
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            response.headers_mut().insert(CONTENT_DISPOSITION, value);
        }
    }
    Ok(response)
}

/// Render a response whose body is already in memory.
///
/// File bodies are not read here; use [`render`] for those.
pub fn render_text(head: &ResponseHead, built: ApiResponse) -> Response {
    let body = match built.body {
        ResponseBody::Text(text) => Body::from(text),
        ResponseBody::Empty | ResponseBody::File { .. } => Body::empty(),
    };
    base_response(head, &built.content_type, body)
}

fn base_response(head: &ResponseHead, mime: &str, body: Body) -> Response {
    let status = StatusCode::from_u16(head.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    // 204 and 304 never carry a body, even when the builder produced one.
    let bodyless = matches!(status, StatusCode::NO_CONTENT | StatusCode::NOT_MODIFIED);

    let mut response = if bodyless {
        Response::new(Body::empty())
    } else {
        Response::new(body)
    };
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in head.headers() {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid response header"),
        }
    }

    if !bodyless && mime != content_type::NULL {
        if let Ok(value) = HeaderValue::from_str(mime) {
            headers.insert(CONTENT_TYPE, value);
        }
    }
    response
}
