//! HTTP transport implementation.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

use super::TransportError;
use crate::cancellation::CancelToken;
use crate::config::{resolve_url, GatewayConfig};
use crate::errors::GatewayError;

/// The five verbs the gateway dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// PATCH request.
    Patch,
    /// DELETE request.
    Delete,
}

impl HttpMethod {
    /// Returns the canonical upper-case verb name.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Returns true if requests with this verb carry a body.
    pub fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(GatewayError::UnsupportedMethod {
                method: s.to_string(),
            }),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A single request as handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path, relative to the base address unless absolute.
    pub path: String,
    /// Query parameters; see [`query_pairs`] for how they are encoded.
    pub query: Option<Value>,
    /// JSON request body. Always `None` for GET and DELETE.
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Creates a request, discarding the body for verbs that carry none.
    pub fn new(
        method: HttpMethod,
        path: impl Into<String>,
        query: Option<Value>,
        body: Option<Value>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            query,
            body: body.filter(|_| method.carries_body()),
        }
    }
}

/// Flattens untyped query parameters into `(key, value)` pairs.
///
/// Nulls are skipped, array items repeat the key as `key[]` and nested
/// objects become `key[inner]`. Strings are sent as-is; other scalars use
/// their JSON text. A top-level value that is not an object yields no pairs.
pub fn query_pairs(query: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Value::Object(map) = query {
        for (key, value) in map {
            push_pair(&mut pairs, key.clone(), value);
        }
    }
    pairs
}

fn push_pair(pairs: &mut Vec<(String, String)>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Bool(_) | Value::Number(_) => pairs.push((key, value.to_string())),
        Value::Array(items) => {
            let key = format!("{}[]", key);
            for item in items {
                push_pair(pairs, key.clone(), item);
            }
        }
        Value::Object(map) => {
            for (inner, item) in map {
                push_pair(pairs, format!("{}[{}]", key, inner), item);
            }
        }
    }
}

/// HTTP response representation. Response headers are not kept.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Returns true if the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON. An empty body decodes as `null`.
    ///
    /// A body that is not JSON is offered to `T` as a plain string; the JSON
    /// error is returned only if that fails too.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let parsed = if self.body.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_value(Value::Null)
        } else {
            serde_json::from_slice(&self.body)
        };

        parsed.or_else(|error| {
            let text = String::from_utf8_lossy(&self.body).into_owned();
            serde_json::from_value(Value::String(text)).map_err(|_| error)
        })
    }
}

/// HTTP transport trait.
///
/// Implementations must be safe to share between concurrent calls and must
/// abort the request once `cancel` fires.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request.
    async fn send(
        &self,
        request: HttpRequest,
        cancel: CancelToken,
    ) -> Result<HttpResponse, TransportError>;
}

/// HTTP transport implementation using reqwest.
pub struct HttpTransportImpl {
    client: Client,
    base_url: String,
}

impl HttpTransportImpl {
    /// Creates a transport from a validated configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = ClientBuilder::new()
            .default_headers(config.header_map()?)
            .cookie_store(config.send_credentials())
            .build()
            .map_err(|e| GatewayError::configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }
}

#[async_trait]
impl HttpTransport for HttpTransportImpl {
    #[instrument(skip(self, request, cancel), fields(method = %request.method, path = %request.path))]
    async fn send(
        &self,
        request: HttpRequest,
        cancel: CancelToken,
    ) -> Result<HttpResponse, TransportError> {
        let url = resolve_url(&self.base_url, &request.path);

        let mut req_builder = self.client.request(request.method.into(), &url);

        if let Some(query) = &request.query {
            let pairs = query_pairs(query);
            if !pairs.is_empty() {
                req_builder = req_builder.query(&pairs);
            }
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.json(body);
        }

        let exchange = async move {
            let response = req_builder.send().await?;

            let status = response.status().as_u16();
            let body = response.bytes().await?;

            Ok::<_, TransportError>(HttpResponse { status, body })
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("Request aborted by cancel token");
                Err(TransportError::Cancelled)
            }
            result = exchange => result,
        }
    }
}

impl fmt::Debug for HttpTransportImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransportImpl")
            .field("base_url", &self.base_url)
            .finish()
    }
}
