use restful_core::negotiation::ResponseKind;

/// A configuration variable that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{var} is invalid: {message}")]
pub struct ConfigError {
    pub var: &'static str,
    pub message: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Query parameter that marks a JSONP call and names its callback.
    pub jsonp_key: String,
    /// Pretty-print JSON and JSONP bodies.
    pub pretty_print: bool,
    /// Extra content type registrations applied on top of the defaults.
    pub response_types: Vec<(String, ResponseKind)>,
    /// Accepted bearer tokens. Empty disables authentication.
    pub api_tokens: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            request_timeout_secs: 30,
            jsonp_key: "jsonp".into(),
            pretty_print: false,
            response_types: Vec::new(),
            api_tokens: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default   |
    /// |------------------------|-----------|
    /// | `HOST`                 | `0.0.0.0` |
    /// | `PORT`                 | `3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`      |
    /// | `JSONP_KEY`            | `jsonp`   |
    /// | `PRETTY_PRINT`         | `false`   |
    /// | `RESPONSE_TYPES`       | (none)    |
    /// | `API_TOKENS`           | (none)    |
    ///
    /// `RESPONSE_TYPES` is a comma-separated list of `mime=kind` pairs, e.g.
    /// `text/csv=text,application/hal+json=text`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`ServerConfig::from_env`] but reading from `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError {
                var: "PORT",
                message: format!("'{raw}' is not a valid u16"),
            })?,
            None => defaults.port,
        };

        let request_timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError {
                var: "REQUEST_TIMEOUT_SECS",
                message: format!("'{raw}' is not a valid u64"),
            })?,
            None => defaults.request_timeout_secs,
        };

        let jsonp_key = lookup("JSONP_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .unwrap_or(defaults.jsonp_key);

        let pretty_print = match lookup("PRETTY_PRINT") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError {
                var: "PRETTY_PRINT",
                message: format!("'{raw}' is not a boolean"),
            })?,
            None => defaults.pretty_print,
        };

        let response_types = match lookup("RESPONSE_TYPES") {
            Some(raw) => parse_response_types(&raw)?,
            None => defaults.response_types,
        };

        let api_tokens = lookup("API_TOKENS")
            .map(|raw| split_list(&raw).map(str::to_string).collect())
            .unwrap_or(defaults.api_tokens);

        Ok(Self {
            host,
            port,
            request_timeout_secs,
            jsonp_key,
            pretty_print,
            response_types,
            api_tokens,
        })
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_response_types(raw: &str) -> Result<Vec<(String, ResponseKind)>, ConfigError> {
    split_list(raw)
        .map(|pair| {
            let (mime, kind) = pair.split_once('=').ok_or_else(|| ConfigError {
                var: "RESPONSE_TYPES",
                message: format!("expected mime=kind, got '{pair}'"),
            })?;
            let kind = kind.parse::<ResponseKind>().map_err(|e| ConfigError {
                var: "RESPONSE_TYPES",
                message: e.to_string(),
            })?;
            Ok((mime.trim().to_ascii_lowercase(), kind))
        })
        .collect()
}
