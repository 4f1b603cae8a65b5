use super::{Request, Transport};
use crate::error::{HarnessError, Result};
use crate::graphql::Response;
use crate::logging::{log_http_request, log_performance};
use reqwest::blocking::Client;
use std::time::{Duration, Instant};

const USER_AGENT: &str = concat!("gql-harness/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP transport. Status codes are never turned into errors.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HarnessError::config("timeout", format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<Response> {
        let url = request.endpoint().as_str();
        log_http_request("POST", url, None);
        let started = Instant::now();

        let mut builder = self.client.post(request.endpoint().clone()).json(&request.wire_body());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .map_err(|e| HarnessError::transport(url, describe(&e)))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| HarnessError::transport(url, describe(&e)))?;

        log_http_request("POST", url, Some(status));
        log_performance("graphql_request", started.elapsed().as_millis() as u64);
        tracing::trace!(query = request.body(), body = %text, "GraphQL exchange");

        Ok(Response::from_body_text(status, request.body(), &text))
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else if err.is_builder() {
        format!("invalid request: {err}")
    } else {
        err.to_string()
    }
}
