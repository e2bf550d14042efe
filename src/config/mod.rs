//! Configuration module for the gateway.
//!
//! A [`GatewayConfig`] is validated once at build time and then consumed by
//! the transport. Construction fails fast when the base address is missing,
//! blank or not an absolute HTTP(S) URL.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::errors::{GatewayError, GatewayResult};

/// Configuration for a [`Gateway`](crate::Gateway).
#[derive(Clone)]
pub struct GatewayConfig {
    base_url: String,
    default_headers: Vec<(String, String)>,
    send_credentials: bool,
}

impl GatewayConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::new()
    }

    /// Creates a configuration with only a base address.
    pub fn new(base_url: impl Into<String>) -> GatewayResult<Self> {
        GatewayConfigBuilder::new().base_url(base_url).build()
    }

    /// Base address every relative path is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Headers attached to every request.
    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    /// Whether cookies are stored and replayed across requests.
    pub fn send_credentials(&self) -> bool {
        self.send_credentials
    }

    /// Default headers as a header map for the engine.
    pub(crate) fn header_map(&self) -> GatewayResult<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(self.default_headers.len());
        for (name, value) in &self.default_headers {
            let (name, value) = parse_header(name, value)?;
            headers.append(name, value);
        }
        Ok(headers)
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header_names: Vec<&str> = self
            .default_headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();

        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("default_headers", &header_names)
            .field("send_credentials", &self.send_credentials)
            .finish()
    }
}

/// Builder for `GatewayConfig`.
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    base_url: Option<String>,
    default_headers: Vec<(String, String)>,
    send_credentials: bool,
}

impl GatewayConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Adds a default header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Adds several default headers.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.default_headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Enables or disables the per-gateway cookie store.
    pub fn send_credentials(mut self, enabled: bool) -> Self {
        self.send_credentials = enabled;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> GatewayResult<GatewayConfig> {
        let base_url = self
            .base_url
            .ok_or_else(|| GatewayError::configuration("Base URL is required"))?;

        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(GatewayError::configuration("Base URL cannot be empty"));
        }

        let parsed = Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayError::configuration(format!(
                "Base URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        for (name, value) in &self.default_headers {
            parse_header(name, value)?;
        }

        Ok(GatewayConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers: self.default_headers,
            send_credentials: self.send_credentials,
        })
    }
}

fn parse_header(name: &str, value: &str) -> GatewayResult<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| GatewayError::configuration(format!("Invalid header name '{}'", name)))?;
    let header_value = HeaderValue::from_str(value).map_err(|_| {
        GatewayError::configuration(format!("Invalid value for header '{}'", name))
    })?;
    Ok((header_name, header_value))
}

/// Joins a request path onto a base address.
///
/// Absolute `http(s)://` paths are used as-is; an empty path is the base itself.
pub(crate) fn resolve_url(base_url: &str, path: &str) -> String {
    let is_absolute = ["http://", "https://"].iter().any(|scheme| {
        path.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    if is_absolute {
        return path.to_string();
    }

    let relative = path.trim_start_matches('/');
    if relative.is_empty() {
        base_url.to_string()
    } else {
        format!("{}/{}", base_url, relative)
    }
}
