use std::sync::Arc;

use restful_core::negotiation::mapper::JsonMapper;
use restful_core::negotiation::{EntityTagValidator, MapperContext, ResponseFactory, ResponseRegistry};

use crate::auth;
use crate::config::ServerConfig;
use crate::pipeline::Pipeline;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; the pipeline and its registries are read-only once
/// built.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Build the response factory and pipeline described by `config`.
    ///
    /// Extra content types from `RESPONSE_TYPES` are served with the JSON
    /// mapper unless a mapper for them already exists.
    pub fn from_config(config: ServerConfig) -> Self {
        let mut registry = ResponseRegistry::default();
        let mut mappers = MapperContext::new(config.pretty_print);
        let json = Arc::new(JsonMapper {
            pretty: config.pretty_print,
        });

        for (mime, kind) in &config.response_types {
            registry.register_builder(mime, kind.builder());
            if !mappers.contains(mime) {
                mappers.register(mime, json.clone());
            }
            tracing::info!(content_type = %mime, kind = %kind, "Registered response type");
        }

        let factory = ResponseFactory::new(registry, mappers, Arc::new(EntityTagValidator));
        let pipeline = Pipeline::new(factory, auth::from_config(&config));

        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }
}
