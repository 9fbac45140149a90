//! Logged, rate-limited HTTP client for the carrier API
//!
//! Wraps `reqwest` with a request-per-minute limiter, explicit connect/read
//! timeouts (the carrier endpoint is an unreliable external dependency) and
//! audit logging of every outbound request and inbound response. The `salt`
//! credential header is redacted before anything reaches the logs.

use governor::{clock::DefaultClock, middleware::NoOpMiddleware, state::NotKeyed, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, Response};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, info};

use crate::carrier::types::CarrierError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Rate-limited HTTP client for carrier requests
pub struct CarrierHttpClient {
    /// Inner HTTP client
    client: Client,

    /// Rate limiter (requests per minute)
    limiter: RateLimiter<NotKeyed, governor::state::InMemoryState, DefaultClock, NoOpMiddleware>,

    /// Configured rate limit
    rate_limit_per_minute: u32,
}

impl CarrierHttpClient {
    /// Create a new carrier client
    ///
    /// # Arguments
    /// * `rate_limit_per_minute` - Maximum requests allowed per minute
    pub fn new(rate_limit_per_minute: u32) -> Self {
        // Ensure at least 1 request per minute
        let rate = NonZeroU32::new(rate_limit_per_minute.max(1)).unwrap();
        let limiter = RateLimiter::direct(Quota::per_minute(rate));

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(10)
            .user_agent("banlingkit-express/1.0")
            .build()
            .expect("Failed to create HTTP client");

        CarrierHttpClient {
            client,
            limiter,
            rate_limit_per_minute,
        }
    }

    /// Build a GET request
    pub fn get(&self, url: &str) -> CarrierRequestBuilder {
        self.request(self.client.get(url), "GET", url)
    }

    /// Build a POST request
    pub fn post(&self, url: &str) -> CarrierRequestBuilder {
        self.request(self.client.post(url), "POST", url)
    }

    /// Build a PUT request
    pub fn put(&self, url: &str) -> CarrierRequestBuilder {
        self.request(self.client.put(url), "PUT", url)
    }

    fn request(&self, builder: RequestBuilder, method: &'static str, url: &str) -> CarrierRequestBuilder {
        CarrierRequestBuilder {
            client: self,
            builder,
            method,
            url: url.to_string(),
            logged_headers: Vec::new(),
            logged_body: None,
        }
    }

    /// Wait for a rate limit permit and execute the request, logging both
    /// directions for auditability.
    async fn execute(
        &self,
        builder: RequestBuilder,
        method: &str,
        url: &str,
        headers: &[(String, String)],
        body: Option<&str>,
    ) -> Result<Response, CarrierError> {
        self.limiter.until_ready().await;

        info!(
            method,
            url,
            headers = ?headers,
            body = body.unwrap_or(""),
            "carrier request"
        );

        let response = builder.send().await?;

        debug!(status = response.status().as_u16(), "carrier response received");
        Ok(response)
    }
}

impl Clone for CarrierHttpClient {
    fn clone(&self) -> Self {
        // Clones get an independent limiter with the same quota
        Self::new(self.rate_limit_per_minute)
    }
}

/// Request builder wrapper that enforces rate limiting and collects a
/// redacted view of the request for the audit log.
pub struct CarrierRequestBuilder<'a> {
    client: &'a CarrierHttpClient,
    builder: RequestBuilder,
    method: &'static str,
    url: String,
    logged_headers: Vec<(String, String)>,
    logged_body: Option<String>,
}

impl<'a> CarrierRequestBuilder<'a> {
    /// Add a header to the request
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.builder = self.builder.header(key, value);
        self.logged_headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Add the `salt` credential header. Logged as `<redacted>`.
    pub fn salt(mut self, salt: &str) -> Self {
        self.builder = self.builder.header("salt", salt);
        self.logged_headers
            .push(("salt".to_string(), "<redacted>".to_string()));
        self
    }

    /// Add JSON body to the request
    pub fn json<T: serde::Serialize + ?Sized>(mut self, json: &T) -> Self {
        self.logged_body = serde_json::to_string(json).ok();
        self.builder = self.builder.json(json);
        self
    }

    /// Add query parameters to the request
    pub fn query<T: serde::Serialize + ?Sized>(mut self, query: &T) -> Self {
        self.builder = self.builder.query(query);
        self
    }

    /// Send the request (waits for a rate limit permit)
    pub async fn send(self) -> Result<Response, CarrierError> {
        self.client
            .execute(
                self.builder,
                self.method,
                &self.url,
                &self.logged_headers,
                self.logged_body.as_deref(),
            )
            .await
    }
}

/// Log an inbound response body after it has been read. Split from the send
/// path because `Response::text` consumes the response.
pub fn log_response_body(status: u16, body: &str) {
    info!(status, body, "carrier response");
}
