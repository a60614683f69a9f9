//! Per-request negotiation inputs and the outgoing status/header state.

/// What the negotiation engine needs to know about the inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    /// JSONP callback name; its presence marks the request as a JSONP call.
    pub jsonp_callback: Option<String>,
    /// First acceptable content type that has a registered builder.
    pub preferred_content_type: Option<String>,
    /// Raw `If-None-Match` header value.
    pub if_none_match: Option<String>,
}

impl RequestInfo {
    pub fn is_jsonp(&self) -> bool {
        self.jsonp_callback.is_some()
    }
}

/// Status code and headers of the response being produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: u16,
    headers: Vec<(String, String)>,
}

impl Default for ResponseHead {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
        }
    }
}

impl ResponseHead {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Set a header, replacing any previous value (names are case-insensitive).
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut head = ResponseHead::default();
        head.set_header("ETag", "\"a\"");
        head.set_header("etag", "\"b\"");
        assert_eq!(head.headers().len(), 1);
        assert_eq!(head.header("ETAG"), Some("\"b\""));
        assert_eq!(head.status(), 200);
    }
}
