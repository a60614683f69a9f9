//! Mappers turn resource data into a wire string for one content type and,
//! where the format allows it, parse request bodies back into a map.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::resource::content_type;

pub trait Mapper: fmt::Debug + Send + Sync {
    fn stringify(&self, data: &Map<String, Value>) -> Result<String, CoreError>;

    fn parse(&self, _input: &str) -> Result<Map<String, Value>, CoreError> {
        Err(CoreError::Mapping(
            "This format cannot be used for request input".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonMapper {
    pub pretty: bool,
}

impl Mapper for JsonMapper {
    fn stringify(&self, data: &Map<String, Value>) -> Result<String, CoreError> {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(data)
        } else {
            serde_json::to_string(data)
        };
        encoded.map_err(|e| CoreError::Mapping(e.to_string()))
    }

    fn parse(&self, input: &str) -> Result<Map<String, Value>, CoreError> {
        if input.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(input) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(CoreError::Mapping("JSON input must be an object".into())),
            Err(e) => Err(CoreError::Mapping(format!("Invalid JSON input: {e}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Query string
// ---------------------------------------------------------------------------

/// `application/x-www-form-urlencoded` with bracketed keys for nesting
/// (`a[b]=1`, `list[]=x`).
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryMapper;

impl Mapper for QueryMapper {
    fn stringify(&self, data: &Map<String, Value>) -> Result<String, CoreError> {
        let mut pairs = Vec::new();
        for (key, value) in data {
            flatten_query(key, value, &mut pairs);
        }
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &pairs {
            serializer.append_pair(key, value);
        }
        Ok(serializer.finish())
    }

    fn parse(&self, input: &str) -> Result<Map<String, Value>, CoreError> {
        let mut root = Value::Object(Map::new());
        for (key, value) in url::form_urlencoded::parse(input.as_bytes()) {
            insert_query_value(&mut root, &split_query_key(&key), value.into_owned());
        }
        match root {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

fn flatten_query(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_query(&format!("{prefix}[{key}]"), child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_query(&format!("{prefix}[{index}]"), child, out);
            }
        }
        Value::Null => out.push((prefix.to_owned(), String::new())),
        Value::Bool(b) => out.push((prefix.to_owned(), if *b { "1" } else { "0" }.to_owned())),
        Value::Number(n) => out.push((prefix.to_owned(), n.to_string())),
        Value::String(s) => out.push((prefix.to_owned(), s.clone())),
    }
}

/// `a[b][]` -> `["a", "b", ""]`. Malformed keys are kept whole.
fn split_query_key(key: &str) -> Vec<String> {
    let whole = || vec![key.to_owned()];
    let Some(open) = key.find('[') else {
        return whole();
    };
    if open == 0 {
        return whole();
    }

    let mut segments = vec![key[..open].to_owned()];
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            return whole();
        };
        segments.push(stripped[..close].to_owned());
        rest = &stripped[close + 1..];
    }
    if rest.is_empty() {
        segments
    } else {
        whole()
    }
}

fn empty_container(next_segment: &str) -> Value {
    if next_segment.is_empty() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

fn insert_query_value(slot: &mut Value, segments: &[String], value: String) {
    let Some((head, tail)) = segments.split_first() else {
        return;
    };

    if head.is_empty() {
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            match tail.first() {
                None => items.push(Value::String(value)),
                Some(next) => {
                    let mut child = empty_container(next);
                    insert_query_value(&mut child, tail, value);
                    items.push(child);
                }
            }
        }
        return;
    }

    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        match tail.first() {
            None => {
                map.insert(head.clone(), Value::String(value));
            }
            Some(next) => {
                let child = map
                    .entry(head.clone())
                    .or_insert_with(|| empty_container(next));
                insert_query_value(child, tail, value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// XML
// ---------------------------------------------------------------------------

/// One element per key under a configurable root; array items are wrapped
/// in `<item>` elements.
#[derive(Debug, Clone)]
pub struct XmlMapper {
    pub root: String,
}

impl Default for XmlMapper {
    fn default() -> Self {
        Self {
            root: "root".to_string(),
        }
    }
}

impl Mapper for XmlMapper {
    fn stringify(&self, data: &Map<String, Value>) -> Result<String, CoreError> {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let root = element_name(&self.root);
        out.push_str(&format!("<{root}>"));
        for (key, value) in data {
            write_element(&mut out, key, value);
        }
        out.push_str(&format!("</{root}>"));
        Ok(out)
    }
}

fn write_element(out: &mut String, name: &str, value: &Value) {
    let name = element_name(name);
    match value {
        Value::Null => out.push_str(&format!("<{name}/>")),
        Value::Object(map) => {
            out.push_str(&format!("<{name}>"));
            for (key, child) in map {
                write_element(out, key, child);
            }
            out.push_str(&format!("</{name}>"));
        }
        Value::Array(items) => {
            out.push_str(&format!("<{name}>"));
            for child in items {
                write_element(out, "item", child);
            }
            out.push_str(&format!("</{name}>"));
        }
        Value::String(s) => out.push_str(&format!("<{name}>{}</{name}>", escape_xml(s))),
        Value::Bool(b) => out.push_str(&format!("<{name}>{b}</{name}>")),
        Value::Number(n) => out.push_str(&format!("<{name}>{n}</{name}>")),
    }
}

fn element_name(name: &str) -> Cow<'_, str> {
    let is_start = |c: char| c.is_ascii_alphabetic() || c == '_';
    let is_rest = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');

    let mut chars = name.chars();
    let valid = chars.next().is_some_and(is_start) && chars.all(is_rest);
    if valid {
        return Cow::Borrowed(name);
    }

    let sanitized: String = name
        .chars()
        .map(|c| if is_rest(c) { c } else { '_' })
        .collect();
    if sanitized.chars().next().is_some_and(is_start) {
        Cow::Owned(sanitized)
    } else {
        Cow::Owned(format!("_{sanitized}"))
    }
}

fn escape_xml(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

// ---------------------------------------------------------------------------
// Data URL
// ---------------------------------------------------------------------------

/// Encodes `data.src` as `data:<data.type>;base64,<src>`; empty data encodes
/// to an empty string.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUrlMapper;

impl Mapper for DataUrlMapper {
    fn stringify(&self, data: &Map<String, Value>) -> Result<String, CoreError> {
        if data.is_empty() {
            return Ok(String::new());
        }
        let src = data
            .get("src")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::Mapping("Data URL resource requires a 'src' string".into()))?;
        let mime = data
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::Mapping("Data URL resource requires a 'type' string".into()))?;
        Ok(format!("data:{mime};base64,{}", STANDARD.encode(src)))
    }

    fn parse(&self, input: &str) -> Result<Map<String, Value>, CoreError> {
        let invalid = || CoreError::Mapping("Invalid data URL".into());
        let rest = input.trim().strip_prefix("data:").ok_or_else(invalid)?;
        let (mime, payload) = rest.split_once(";base64,").ok_or_else(invalid)?;
        let bytes = STANDARD.decode(payload).map_err(|_| invalid())?;
        let src = String::from_utf8(bytes).map_err(|_| invalid())?;

        let mut map = Map::new();
        map.insert("type".into(), Value::String(mime.to_owned()));
        map.insert("src".into(), Value::String(src));
        Ok(map)
    }
}

// ---------------------------------------------------------------------------
// Null
// ---------------------------------------------------------------------------

/// For builders that do not serialize (files, empty responses).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMapper;

impl Mapper for NullMapper {
    fn stringify(&self, _data: &Map<String, Value>) -> Result<String, CoreError> {
        Ok(String::new())
    }
}

// ---------------------------------------------------------------------------
// Mapper registry
// ---------------------------------------------------------------------------

/// Mappers keyed by lowercase content type.
#[derive(Debug, Clone)]
pub struct MapperContext {
    mappers: HashMap<String, Arc<dyn Mapper>>,
}

impl Default for MapperContext {
    fn default() -> Self {
        Self::new(false)
    }
}

impl MapperContext {
    /// Built-in mappers for every default content type.
    pub fn new(pretty_print: bool) -> Self {
        let json: Arc<dyn Mapper> = Arc::new(JsonMapper {
            pretty: pretty_print,
        });
        let null: Arc<dyn Mapper> = Arc::new(NullMapper);

        let mut context = Self {
            mappers: HashMap::new(),
        };
        context
            .register(content_type::JSON, Arc::clone(&json))
            .register(content_type::JSONP, json)
            .register(content_type::XML, Arc::new(XmlMapper::default()))
            .register(content_type::QUERY, Arc::new(QueryMapper))
            .register(content_type::DATA_URL, Arc::new(DataUrlMapper))
            .register(content_type::FILE, Arc::clone(&null))
            .register(content_type::NULL, null);
        context
    }

    pub fn register(&mut self, content_type: &str, mapper: Arc<dyn Mapper>) -> &mut Self {
        self.mappers.insert(content_type.to_ascii_lowercase(), mapper);
        self
    }

    pub fn contains(&self, content_type: &str) -> bool {
        self.mappers.contains_key(&content_type.to_ascii_lowercase())
    }

    pub fn get_mapper(&self, content_type: &str) -> Result<Arc<dyn Mapper>, CoreError> {
        self.mappers
            .get(&content_type.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| {
                CoreError::InvalidState(format!("No mapper registered for '{content_type}'"))
            })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn json_round_trip_and_rejects_non_objects() {
        let data = map(json!({"id": 1, "tags": ["a"]}));
        let text = JsonMapper::default().stringify(&data).unwrap();
        assert_eq!(text, r#"{"id":1,"tags":["a"]}"#);
        assert_eq!(JsonMapper::default().parse(&text).unwrap(), data);
        assert_matches!(JsonMapper::default().parse("[1,2]"), Err(CoreError::Mapping(_)));
        assert_matches!(JsonMapper::default().parse("{"), Err(CoreError::Mapping(_)));
        assert!(JsonMapper::default().parse("  ").unwrap().is_empty());
    }

    #[test]
    fn pretty_json_is_indented() {
        let text = JsonMapper { pretty: true }
            .stringify(&map(json!({"id": 1})))
            .unwrap();
        assert_eq!(text, "{\n  \"id\": 1\n}");
    }

    #[test]
    fn query_stringify_flattens_nested_keys() {
        let data = map(json!({"name": "Jane Doe", "tags": ["a", "b"], "meta": {"ok": true}}));
        let text = QueryMapper.stringify(&data).unwrap();
        assert_eq!(
            text,
            "meta%5Bok%5D=1&name=Jane+Doe&tags%5B0%5D=a&tags%5B1%5D=b"
        );
    }

    #[test]
    fn query_parse_builds_nested_values() {
        let parsed = QueryMapper
            .parse("name=Jane&tags[]=a&tags[]=b&meta[city]=Brno&broken[=x")
            .unwrap();
        assert_eq!(
            Value::Object(parsed),
            json!({
                "name": "Jane",
                "tags": ["a", "b"],
                "meta": {"city": "Brno"},
                "broken[": "x"
            })
        );
    }

    #[test]
    fn xml_escapes_text_and_sanitizes_names() {
        let data = map(json!({"title": "a < b & c", "items": [1, 2], "1st": null}));
        let text = XmlMapper::default().stringify(&data).unwrap();
        assert_eq!(
            text,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root><_1st/>\
             <items><item>1</item><item>2</item></items><title>a &lt; b &amp; c</title></root>"
        );
    }

    #[test]
    fn data_url_round_trip() {
        let data = map(json!({"src": "hello", "type": "text/plain"}));
        let text = DataUrlMapper.stringify(&data).unwrap();
        assert_eq!(text, "data:text/plain;base64,aGVsbG8=");
        assert_eq!(DataUrlMapper.parse(&text).unwrap(), data);
        assert_matches!(
            DataUrlMapper.stringify(&map(json!({"src": "x"}))),
            Err(CoreError::Mapping(_))
        );
        assert_eq!(DataUrlMapper.stringify(&Map::new()).unwrap(), "");
    }

    #[test]
    fn context_lookup_is_case_insensitive() {
        let context = MapperContext::default();
        assert!(context.get_mapper("Application/JSON").is_ok());
        assert_matches!(context.get_mapper("text/csv"), Err(CoreError::InvalidState(_)));
    }
}
