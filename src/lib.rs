//! Request Gateway
//!
//! A small HTTP facade that turns verb-shaped requests into cold,
//! cancellable, single-value streams. Each [`Gateway`] owns one `reqwest`
//! client bound to a base address. The verb methods return a
//! [`ResultStream`] that sends nothing until polled, then yields the decoded
//! response body (or one error) and ends. Dropping the stream while the
//! request is in flight aborts it.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use request_gateway::{Gateway, GatewayConfig};
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::builder()
//!         .base_url("https://api.example.com")
//!         .header("accept", "application/json")
//!         .build()?;
//!     let gateway = Gateway::new(config)?;
//!
//!     let created: Option<_> = gateway
//!         .post::<Value>("/users", json!({"name": "Ana"}), None)
//!         .single()
//!         .await;
//!     println!("{:?}", created);
//!     Ok(())
//! }
//! ```
//!
//! # Cancellation
//!
//! ```rust,no_run
//! use request_gateway::{Gateway, GatewayConfig};
//! use serde_json::Value;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Gateway::new(GatewayConfig::new("https://api.example.com")?)?;
//!
//!     // The stream is dropped on timeout, which cancels the request.
//!     let outcome = tokio::time::timeout(
//!         Duration::from_secs(2),
//!         gateway.get::<Value>("/slow", None).single(),
//!     )
//!     .await;
//!     println!("{:?}", outcome.is_err());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cancellation;
pub mod client;
pub mod config;
pub mod errors;
pub mod mocks;
pub mod observability;
pub mod stream;
pub mod transport;

// Re-exports for convenience
pub use cancellation::{CancelToken, CancellationHandle};
pub use client::{Gateway, GatewayBuilder};
pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use errors::{GatewayError, GatewayResult};
pub use stream::{CallState, ResultStream};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};
