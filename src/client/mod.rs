//! The request gateway.
//!
//! A [`Gateway`] owns one transport bound to a base address and exposes the
//! five verb methods. Each method only builds a [`ResultStream`]; nothing is
//! sent until that stream is polled.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::config::{GatewayConfig, GatewayConfigBuilder};
use crate::errors::GatewayResult;
use crate::stream::ResultStream;
use crate::transport::{HttpMethod, HttpRequest, HttpTransport, HttpTransportImpl};

/// Verb-shaped HTTP facade returning cold, cancellable result streams.
///
/// # Example
///
/// ```rust,no_run
/// use futures::StreamExt;
/// use request_gateway::{Gateway, GatewayConfig};
/// use serde_json::{json, Value};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let gateway = Gateway::new(GatewayConfig::new("https://api.example.com")?)?;
///
///     let mut users = gateway.get::<Value>("/users", Some(json!({"active": true})));
///     while let Some(result) = users.next().await {
///         println!("{}", result?);
///     }
///     Ok(())
/// }
/// ```
pub struct Gateway {
    config: GatewayConfig,
    transport: Arc<dyn HttpTransport>,
}

impl Gateway {
    /// Creates a new gateway builder.
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Creates a gateway with the reqwest transport.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        GatewayBuilder::from_config(config).build()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// `GET path` with `params` as the query string.
    pub fn get<T: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        params: Option<Value>,
    ) -> ResultStream<T> {
        self.dispatch(HttpMethod::Get, path, params, None)
    }

    /// `POST path` with `data` as the JSON body and `query_params` as the query string.
    pub fn post<T: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        data: Value,
        query_params: Option<Value>,
    ) -> ResultStream<T> {
        self.dispatch(HttpMethod::Post, path, query_params, Some(data))
    }

    /// `PUT path` with `body` as the JSON body and `params` as the query string.
    pub fn put<T: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        body: Value,
        params: Option<Value>,
    ) -> ResultStream<T> {
        self.dispatch(HttpMethod::Put, path, params, Some(body))
    }

    /// `PATCH path` with `body` as the JSON body and `params` as the query string.
    pub fn patch<T: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        body: Value,
        params: Option<Value>,
    ) -> ResultStream<T> {
        self.dispatch(HttpMethod::Patch, path, params, Some(body))
    }

    /// `DELETE path` with `params` as the query string.
    pub fn delete<T: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        params: Option<Value>,
    ) -> ResultStream<T> {
        self.dispatch(HttpMethod::Delete, path, params, None)
    }

    /// Builds the stream for any supported verb.
    ///
    /// `body` is ignored for GET and DELETE.
    #[instrument(skip_all, fields(method = %method))]
    pub fn dispatch<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: impl Into<String>,
        query: Option<Value>,
        body: Option<Value>,
    ) -> ResultStream<T> {
        let request = HttpRequest::new(method, path, query, body);
        tracing::debug!(path = %request.path, "Prepared request");
        ResultStream::new(Arc::clone(&self.transport), request)
    }

    /// Like [`dispatch`](Self::dispatch) but takes the verb as text.
    ///
    /// Fails immediately with
    /// [`GatewayError::UnsupportedMethod`](crate::GatewayError::UnsupportedMethod)
    /// for anything other than the five supported verbs; no stream is built.
    pub fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        path: impl Into<String>,
        query: Option<Value>,
        body: Option<Value>,
    ) -> GatewayResult<ResultStream<T>> {
        let method = method.parse::<HttpMethod>()?;
        Ok(self.dispatch(method, path, query, body))
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for the gateway.
#[derive(Default)]
pub struct GatewayBuilder {
    config_builder: GatewayConfigBuilder,
    config: Option<GatewayConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl GatewayBuilder {
    /// Creates a new gateway builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from an existing configuration.
    pub fn from_config(config: GatewayConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::default()
        }
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(base_url);
        self
    }

    /// Adds a default header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.header(name, value);
        self
    }

    /// Enables or disables the cookie store.
    pub fn send_credentials(mut self, enabled: bool) -> Self {
        self.config_builder = self.config_builder.send_credentials(enabled);
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the gateway.
    pub fn build(self) -> GatewayResult<Gateway> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_builder.build()?,
        };

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransportImpl::new(&config)?),
        };

        tracing::debug!(base_url = %config.base_url(), "Gateway created");

        Ok(Gateway { config, transport })
    }
}
