//! Response builders: one per wire representation.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{json, Map, Value};

use super::mapper::Mapper;
use crate::error::CoreError;
use crate::resource::content_type;

static CALLBACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$").expect("valid regex"));

/// Body of a built response, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Empty,
    Text(String),
    /// A file the transport streams from disk.
    File { path: PathBuf, name: Option<String> },
}

/// The wire-ready output of a builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub content_type: String,
    pub body: ResponseBody,
}

impl ApiResponse {
    /// No body at all (304 short-circuit, null content type).
    pub fn null() -> Self {
        Self {
            content_type: content_type::NULL.to_string(),
            body: ResponseBody::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.body {
            ResponseBody::Empty => true,
            ResponseBody::Text(text) => text.is_empty(),
            ResponseBody::File { .. } => false,
        }
    }
}

/// Request-dependent inputs a builder may need beyond the data itself.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub jsonp_callback: Option<&'a str>,
    /// Status already set on the outgoing response.
    pub status: u16,
}

pub trait ResponseBuilder: fmt::Debug + Send + Sync {
    fn build(
        &self,
        data: &Map<String, Value>,
        mapper: &dyn Mapper,
        content_type: &str,
        context: &BuildContext<'_>,
    ) -> Result<ApiResponse, CoreError>;

    /// Whether an `Accept` header may select this builder for arbitrary
    /// resource data.
    fn negotiable(&self) -> bool {
        true
    }
}

/// Mapper output as the body (JSON, XML, query string, data URL).
#[derive(Debug, Default, Clone, Copy)]
pub struct TextResponse;

impl ResponseBuilder for TextResponse {
    fn build(
        &self,
        data: &Map<String, Value>,
        mapper: &dyn Mapper,
        content_type: &str,
        _context: &BuildContext<'_>,
    ) -> Result<ApiResponse, CoreError> {
        Ok(ApiResponse {
            content_type: content_type.to_string(),
            body: ResponseBody::Text(mapper.stringify(data)?),
        })
    }
}

/// `callback({"response": <data>, "status": <code>});`
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonpResponse;

impl ResponseBuilder for JsonpResponse {
    fn build(
        &self,
        data: &Map<String, Value>,
        mapper: &dyn Mapper,
        _content_type: &str,
        context: &BuildContext<'_>,
    ) -> Result<ApiResponse, CoreError> {
        let callback = context
            .jsonp_callback
            .ok_or_else(|| CoreError::InvalidArgument("JSONP response requires a callback".into()))?;
        if !CALLBACK_RE.is_match(callback) {
            return Err(CoreError::InvalidArgument(format!(
                "Invalid JSONP callback name: {callback}"
            )));
        }

        let mut wrapped = Map::new();
        wrapped.insert("response".into(), Value::Object(data.clone()));
        wrapped.insert("status".into(), json!(context.status));
        let payload = mapper.stringify(&wrapped)?;

        Ok(ApiResponse {
            content_type: content_type::JSONP.to_string(),
            body: ResponseBody::Text(format!("{callback}({payload});")),
        })
    }

    // Selected by the callback query parameter, never by `Accept`.
    fn negotiable(&self) -> bool {
        false
    }
}

/// Streams the file at `data.path`, offering `data.name` as download name.
///
/// Empty data builds an empty body.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileResponse;

impl ResponseBuilder for FileResponse {
    fn build(
        &self,
        data: &Map<String, Value>,
        _mapper: &dyn Mapper,
        content_type: &str,
        _context: &BuildContext<'_>,
    ) -> Result<ApiResponse, CoreError> {
        if data.is_empty() {
            return Ok(ApiResponse {
                content_type: content_type.to_string(),
                body: ResponseBody::Empty,
            });
        }
        let path = data
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::Mapping("File resource requires a 'path' string".into()))?;
        let name = data.get("name").and_then(Value::as_str).map(str::to_owned);

        Ok(ApiResponse {
            content_type: content_type.to_string(),
            body: ResponseBody::File {
                path: PathBuf::from(path),
                name,
            },
        })
    }

    fn negotiable(&self) -> bool {
        false
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullResponse;

impl ResponseBuilder for NullResponse {
    fn build(
        &self,
        _data: &Map<String, Value>,
        _mapper: &dyn Mapper,
        _content_type: &str,
        _context: &BuildContext<'_>,
    ) -> Result<ApiResponse, CoreError> {
        Ok(ApiResponse::null())
    }

    fn negotiable(&self) -> bool {
        false
    }
}

/// Names of the built-in builders, as used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Text,
    Jsonp,
    File,
    Null,
}

impl ResponseKind {
    pub fn builder(self) -> Arc<dyn ResponseBuilder> {
        match self {
            ResponseKind::Text => Arc::new(TextResponse),
            ResponseKind::Jsonp => Arc::new(JsonpResponse),
            ResponseKind::File => Arc::new(FileResponse),
            ResponseKind::Null => Arc::new(NullResponse),
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseKind::Text => "text",
            ResponseKind::Jsonp => "jsonp",
            ResponseKind::File => "file",
            ResponseKind::Null => "null",
        };
        f.write_str(name)
    }
}

impl FromStr for ResponseKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ResponseKind::Text),
            "jsonp" => Ok(ResponseKind::Jsonp),
            "file" => Ok(ResponseKind::File),
            "null" => Ok(ResponseKind::Null),
            other => Err(CoreError::InvalidArgument(format!(
                "Response class does not exist: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::negotiation::mapper::{JsonMapper, NullMapper};

    fn context(callback: Option<&str>) -> BuildContext<'_> {
        BuildContext {
            jsonp_callback: callback,
            status: 200,
        }
    }

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn text_response_uses_mapper() {
        let response = TextResponse
            .build(&data(json!({"id": 7})), &JsonMapper::default(), "application/json", &context(None))
            .unwrap();
        assert_eq!(response.content_type, "application/json");
        assert_eq!(response.body, ResponseBody::Text(r#"{"id":7}"#.into()));
    }

    #[test]
    fn jsonp_wraps_payload_in_callback() {
        let response = JsonpResponse
            .build(
                &data(json!({"id": 7})),
                &JsonMapper::default(),
                content_type::JSONP,
                &context(Some("app.handle")),
            )
            .unwrap();
        assert_eq!(
            response.body,
            ResponseBody::Text(r#"app.handle({"response":{"id":7},"status":200});"#.into())
        );
    }

    #[test]
    fn jsonp_rejects_unsafe_callbacks() {
        let result = JsonpResponse.build(
            &Map::new(),
            &JsonMapper::default(),
            content_type::JSONP,
            &context(Some("alert(1)//")),
        );
        assert_matches!(result, Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn file_response_requires_path() {
        let response = FileResponse
            .build(
                &data(json!({"path": "/tmp/report.csv", "name": "report.csv"})),
                &NullMapper,
                content_type::FILE,
                &context(None),
            )
            .unwrap();
        assert_eq!(
            response.body,
            ResponseBody::File {
                path: PathBuf::from("/tmp/report.csv"),
                name: Some("report.csv".into())
            }
        );
        assert_matches!(
            FileResponse.build(
                &data(json!({"name": "report.csv"})),
                &NullMapper,
                content_type::FILE,
                &context(None)
            ),
            Err(CoreError::Mapping(_))
        );
    }

    #[test]
    fn file_response_without_data_is_empty() {
        let response = FileResponse
            .build(&Map::new(), &NullMapper, content_type::FILE, &context(None))
            .unwrap();
        assert_eq!(response.content_type, content_type::FILE);
        assert_eq!(response.body, ResponseBody::Empty);
    }

    #[test]
    fn kind_names_parse() {
        assert_eq!("Text".parse::<ResponseKind>().unwrap(), ResponseKind::Text);
        assert_eq!(ResponseKind::Jsonp.to_string(), "jsonp");
        assert_matches!("csv".parse::<ResponseKind>(), Err(CoreError::InvalidArgument(_)));
    }
}
