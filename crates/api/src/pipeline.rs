//! Request handling pipeline.
//!
//! Every resource endpoint runs the same stages in order:
//!
//! 1. **authenticate** -- the configured [`Authenticator`].
//! 2. **validate** -- the handler declares field rules on the [`Input`];
//!    failures abort with 422 only when rules were declared.
//! 3. **build resource** -- the handler fills a [`Resource`].
//! 4. **negotiate** -- the [`ResponseFactory`] renders the resource.
//!
//! Any failure is converted into an error envelope which goes through the
//! same negotiation, once.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use restful_core::error::CoreError;
use restful_core::negotiation::{RequestInfo, ResponseFactory, ResponseHead};
use restful_core::resource::{content_type, Resource};
use restful_core::validation::Input;

use crate::auth::Authenticator;
use crate::error::AppError;
use crate::extract::RestRequest;
use crate::response::render;

/// One resource endpoint.
pub trait ResourceHandler: Send + Sync {
    /// Declare validation rules for the request input.
    fn validate(&self, _input: &mut Input) {}

    /// Status for a successful response; `None` keeps 200.
    fn status(&self) -> Option<u16> {
        None
    }

    fn build(&self, input: &Input, resource: &mut Resource) -> Result<(), AppError>;
}

pub struct Pipeline {
    factory: ResponseFactory,
    authenticator: Arc<dyn Authenticator>,
}

impl Pipeline {
    pub fn new(factory: ResponseFactory, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            factory,
            authenticator,
        }
    }

    pub fn factory(&self) -> &ResponseFactory {
        &self.factory
    }

    /// Run all stages for `handler` and produce the HTTP response.
    pub async fn handle(&self, handler: &dyn ResourceHandler, request: RestRequest) -> Response {
        match self.prepare(handler, &request) {
            Ok(resource) => {
                self.send_resource(&resource, handler.status(), &request.info)
                    .await
            }
            Err(err) => self.send_error(err, &request.info).await,
        }
    }

    fn prepare(&self, handler: &dyn ResourceHandler, request: &RestRequest) -> Result<Resource, AppError> {
        self.authenticator.authenticate(&request.headers)?;

        let mut input = Input::new(request.data.clone());
        handler.validate(&mut input);
        if input.has_rules() {
            let errors = input.validate();
            if !errors.is_empty() {
                return Err(AppError::unprocessable_entity(errors));
            }
        }

        let mut resource = Resource::new(default_content_type(&request.info));
        handler.build(&input, &mut resource)?;
        Ok(resource)
    }

    /// Negotiate `resource`; negotiation failures become an error envelope.
    pub async fn send_resource(&self, resource: &Resource, code: Option<u16>, info: &RequestInfo) -> Response {
        let mut head = ResponseHead::default();
        let built = match self.factory.create(resource, code, info, &mut head) {
            Ok(built) => built,
            Err(CoreError::InvalidState(message)) => {
                return self
                    .send_error(AppError::UnsupportedMediaType(message), info)
                    .await
            }
            Err(err) => return self.send_error(err.into(), info).await,
        };

        match render(&head, built).await {
            Ok(response) => response,
            Err(err) => self.send_error(err, info).await,
        }
    }

    /// Send `err` as an error envelope in the client's preferred type.
    ///
    /// If the envelope itself cannot be negotiated, a body-less response with
    /// the envelope's status is returned instead.
    pub async fn send_error(&self, err: AppError, info: &RequestInfo) -> Response {
        let envelope = err.envelope();
        let code = envelope.code;
        let resource = Resource::from_envelope(envelope, default_content_type(info));
        // Failures are never answered with 304.
        let info = &RequestInfo {
            if_none_match: None,
            ..info.clone()
        };
        let bare = || {
            StatusCode::from_u16(code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response()
        };

        let mut head = ResponseHead::default();
        match self.factory.create(&resource, Some(code), info, &mut head) {
            Ok(built) => match render(&head, built).await {
                Ok(response) => response,
                Err(err) => {
                    tracing::error!(error = %err, code, "Failed to render error envelope");
                    bare()
                }
            },
            Err(err) => {
                tracing::error!(error = %err, code, "Failed to negotiate error envelope");
                bare()
            }
        }
    }
}

/// The client's preferred type, falling back to JSON.
fn default_content_type(info: &RequestInfo) -> String {
    info.preferred_content_type
        .clone()
        .unwrap_or_else(|| content_type::JSON.to_string())
}
