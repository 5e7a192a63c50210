//! HTTP access through the WiFi co-processor, and the data-extraction pipeline
//! that turns a response into display values.
//!
//! The crate never talks to a socket itself. Board support implements
//! [`Transport`] on top of its HTTP client, and [`Network`] drives it.
//!
//! # Example
//!
//! ```rust
//! use matrix_portal::network::{CannedTransport, ExtractionSpec, Extracted, Network, Response};
//! use matrix_portal::path;
//! use serde_json::json;
//!
//! # fn main() -> matrix_portal::Result<()> {
//! let body = br#"{"main": {"temp": 21.5, "humidity": 40}}"#;
//! let transport = CannedTransport::new(Response::ok("application/json", body.to_vec()));
//! let mut network = Network::new(transport);
//!
//! let spec = ExtractionSpec::new("https://example.com/weather")
//!     .with_json_paths([path!["main", "temp"]]);
//! let extracted = embassy_futures::block_on(network.fetch_data(&spec))?;
//! assert_eq!(extracted, Extracted::Scalar(json!(21.5)));
//! # Ok(())
//! # }
//! ```

mod canned;
pub mod extract;
mod time_service;

use alloc::{
    borrow::Cow,
    string::{String, ToString},
    vec::Vec,
};
use embassy_time::Duration;

use crate::Result;
use crate::secrets::Secrets;

pub use canned::CannedTransport;
pub use extract::{ExtractionSpec, Extracted, JsonTransform, PathKey, PathSpec, RegexPath};
pub use time_service::{LocalTime, parse_time_reply, time_service_url};

/// Largest JSON body [`Network`] parses unless told otherwise.
pub const DEFAULT_JSON_BUDGET: usize = 32 * 1024;

/// Timeout for a request when the caller doesn't pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One HTTP GET.
#[derive(Clone, Copy, Debug)]
pub struct Request<'a> {
    /// Absolute URL.
    pub url: &'a str,
    /// Extra request headers, in order.
    pub headers: &'a [(String, String)],
    /// Give up after this long.
    pub timeout: Duration,
}

/// An HTTP response as delivered by the [`Transport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status_code: u16,
    /// Reason phrase.
    pub reason: String,
    /// Response headers, in the order received.
    pub headers: Vec<(String, String)>,
    /// Raw body.
    pub body: Vec<u8>,
}

impl Response {
    /// A `200 OK` response with a `content-type` header.
    #[must_use]
    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code: 200,
            reason: "OK".to_string(),
            headers: alloc::vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    /// A response with the given status and no body.
    #[must_use]
    pub fn status(status_code: u16, reason: &str) -> Self {
        Self {
            status_code,
            reason: reason.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// First header called `name`, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// What the `content-type` header says the body is.
    #[must_use]
    pub fn content_kind(&self) -> ContentKind {
        ContentKind::classify(self.header("content-type"))
    }

    /// The body as text; invalid UTF-8 is replaced.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// The broad kind of a response body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentKind {
    /// Anything that isn't JSON or an image.
    Text,
    /// `application/json` or `application/javascript`.
    Json,
    /// `image/*`.
    Image,
}

impl ContentKind {
    /// Classify a `content-type` header value. A missing header means text.
    #[must_use]
    pub fn classify(content_type: Option<&str>) -> Self {
        match content_type {
            Some(value) if value.contains("image/") => Self::Image,
            Some(value)
                if value.contains("application/json")
                    || value.contains("application/javascript") =>
            {
                Self::Json
            }
            _ => Self::Text,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Image => "image",
        }
    }
}

/// The HTTP client provided by the board.
pub trait Transport {
    /// Perform a GET.
    ///
    /// Any status code is a successful transfer; the pipeline decides what a
    /// non-200 status means.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`](crate::Error::Network) when no response arrived.
    async fn get(&mut self, request: &Request<'_>) -> Result<Response>;
}

/// A [`Transport`] plus the JSON parse budget.
#[derive(Debug)]
pub struct Network<T> {
    transport: T,
    json_budget: usize,
}

impl<T: Transport> Network<T> {
    /// Wrap a transport with the default JSON budget.
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            json_budget: DEFAULT_JSON_BUDGET,
        }
    }

    /// Change the largest JSON body that will be parsed.
    #[must_use]
    pub const fn with_json_budget(mut self, json_budget: usize) -> Self {
        self.json_budget = json_budget;
        self
    }

    /// The JSON parse budget in bytes.
    #[must_use]
    pub const fn json_budget(&self) -> usize {
        self.json_budget
    }

    /// Borrow the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Borrow the transport mutably.
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Fetch `url` and return the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Passes on transport failures.
    pub async fn fetch(
        &mut self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<Response> {
        info!("network: retrieving data from {}", url);
        self.transport
            .get(&Request {
                url,
                headers,
                timeout,
            })
            .await
    }

    /// Fetch `spec.url` and run the extraction pipeline on the reply.
    ///
    /// A single value comes back as [`Extracted::Scalar`] when the spec unwraps
    /// single values (the default).
    ///
    /// # Errors
    ///
    /// See [`extract::extract`].
    pub async fn fetch_data(&mut self, spec: &ExtractionSpec) -> Result<Extracted> {
        extract::fetch_and_extract(spec, &mut self.transport, self.json_budget).await
    }

    /// Ask the Adafruit IO time service for the local time.
    ///
    /// `location` overrides `secrets.timezone`; with neither, the service
    /// guesses from the IP address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSecret`](crate::Error::MissingSecret) without
    /// Adafruit IO credentials, [`Error::Transport`](crate::Error::Transport) on
    /// a non-200 reply and [`Error::TimeReply`](crate::Error::TimeReply) if the
    /// reply doesn't parse.
    pub async fn get_local_time(
        &mut self,
        secrets: &Secrets,
        location: Option<&str>,
    ) -> Result<LocalTime> {
        let (username, key) = secrets.aio_credentials()?;
        let location = location.or_else(|| secrets.timezone());
        match location {
            Some(location) => info!("network: getting time for timezone {}", location),
            None => info!("network: getting time from IP address"),
        }
        let url = time_service_url(username, key, location);
        let response = self.fetch(&url, &[], DEFAULT_TIMEOUT).await?;
        if response.status_code != 200 {
            return Err(crate::Error::Transport {
                status_code: response.status_code,
                reason: response.text().into_owned(),
            });
        }
        parse_time_reply(&response.text())
    }
}
