//! Extraction of the negotiation context and input data from a request.

use axum::body::to_bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::{ACCEPT, CONTENT_TYPE, IF_NONE_MATCH};
use axum::http::HeaderMap;
use restful_core::negotiation::mapper::QueryMapper;
use restful_core::negotiation::{Mapper, RequestInfo, ResponseRegistry};
use restful_core::resource::content_type;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::state::AppState;

/// Largest request body the extractor will buffer.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Everything the pipeline needs from an inbound request.
#[derive(Debug, Clone, Default)]
pub struct RestRequest {
    pub info: RequestInfo,
    pub headers: HeaderMap,
    /// Query parameters with the parsed body merged over them.
    pub data: Map<String, Value>,
}

impl FromRequest<AppState> for RestRequest {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let factory = state.pipeline.factory();

        let mut data = QueryMapper.parse(parts.uri.query().unwrap_or(""))?;
        let jsonp_callback = match data.remove(&state.config.jsonp_key) {
            Some(Value::String(callback)) if !callback.is_empty() => Some(callback),
            _ => None,
        };

        let bytes = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| AppError::BadRequest(format!("Cannot read request body: {e}")))?;
        if !bytes.is_empty() {
            let text = std::str::from_utf8(&bytes)
                .map_err(|_| AppError::BadRequest("Request body must be UTF-8".into()))?;
            let mime = parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(media_type)
                .unwrap_or_else(|| content_type::JSON.to_string());
            let mapper = factory.mappers().get_mapper(&mime).map_err(|_| {
                AppError::UnsupportedMediaType(format!("Unsupported request content type: {mime}"))
            })?;
            let body = mapper
                .parse(text)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            data.extend(body);
        }

        let info = RequestInfo {
            jsonp_callback,
            preferred_content_type: parts
                .headers
                .get(ACCEPT)
                .and_then(|v| v.to_str().ok())
                .and_then(|accept| preferred_content_type(accept, factory.registry())),
            if_none_match: parts
                .headers
                .get(IF_NONE_MATCH)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
        };

        Ok(Self {
            info,
            headers: parts.headers,
            data,
        })
    }
}

/// `text/html; charset=utf-8` -> `text/html`.
fn media_type(raw: &str) -> String {
    raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

/// Highest-quality media range in `accept` whose registered builder can be
/// picked by negotiation (see [`ResponseRegistry::is_negotiable`]).
///
/// Wildcards express no preference and are skipped; ties keep header order.
pub fn preferred_content_type(accept: &str, registry: &ResponseRegistry) -> Option<String> {
    let mut ranges: Vec<(String, f32)> = accept
        .split(',')
        .filter_map(|range| {
            let mut parts = range.split(';');
            let mime = parts.next()?.trim().to_ascii_lowercase();
            let quality = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((mime, quality))
        })
        .filter(|(mime, quality)| *quality > 0.0 && !mime.is_empty() && !mime.contains('*'))
        .collect();
    ranges.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranges
        .into_iter()
        .map(|(mime, _)| mime)
        .find(|mime| registry.is_negotiable(mime))
}
