use crate::error::Result;
use crate::graphql::Response;
use crate::query::Operation;
use serde_json::json;
use std::collections::BTreeMap;
use url::Url;

pub mod http;

pub use http::HttpTransport;

pub const TENANT_ID_HEADER: &str = "x-tenant-id";
pub const TENANT_SECRET_HEADER: &str = "x-tenant-secret";
pub const PRODUCT_ID_HEADER: &str = "x-product-id";
pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const API_KEY_HEADER: &str = "x-api-key";

const PROFILE_HEADERS: [&str; 4] = [
    TENANT_ID_HEADER,
    TENANT_SECRET_HEADER,
    PRODUCT_ID_HEADER,
    AUTHORIZATION_HEADER,
];

/// Which identity a request carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderProfile {
    TenantContext {
        tenant_id: String,
        tenant_secret: String,
        product_id: String,
    },
    Bearer {
        token: String,
    },
}

impl HeaderProfile {
    pub fn tenant(
        tenant_id: impl Into<String>,
        tenant_secret: impl Into<String>,
        product_id: impl Into<String>,
    ) -> Self {
        Self::TenantContext {
            tenant_id: tenant_id.into(),
            tenant_secret: tenant_secret.into(),
            product_id: product_id.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::TenantContext {
                tenant_id,
                tenant_secret,
                product_id,
            } => vec![
                (TENANT_ID_HEADER, tenant_id.clone()),
                (TENANT_SECRET_HEADER, tenant_secret.clone()),
                (PRODUCT_ID_HEADER, product_id.clone()),
            ],
            Self::Bearer { token } => vec![(AUTHORIZATION_HEADER, format!("bearer {token}"))],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TenantContext { .. } => "tenant",
            Self::Bearer { .. } => "bearer",
        }
    }
}

/// One network call's worth of endpoint, headers and query text.
///
/// Requests are values: every `with_*` method returns a new request and
/// leaves the receiver untouched, so a template can be shared freely.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    endpoint: Url,
    headers: BTreeMap<String, String>,
    body: String,
}

impl Request {
    pub fn new(endpoint: Url, profile: &HeaderProfile, body: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        for (name, value) in profile.headers() {
            headers.insert(name.to_string(), value);
        }
        Self {
            endpoint,
            headers,
            body: body.into(),
        }
    }

    /// A request with no query text, used as the base for every call in a run
    pub fn template(endpoint: Url, profile: &HeaderProfile) -> Self {
        Self::new(endpoint, profile, String::new())
    }

    /// Replaces the identity headers; non-profile headers such as the API
    /// key are kept.
    pub fn with_profile(&self, profile: &HeaderProfile) -> Self {
        let mut headers = self.headers.clone();
        headers.retain(|name, _| !PROFILE_HEADERS.contains(&name.as_str()));
        for (name, value) in profile.headers() {
            headers.insert(name.to_string(), value);
        }
        Self {
            endpoint: self.endpoint.clone(),
            headers,
            body: self.body.clone(),
        }
    }

    pub fn with_header(&self, name: &str, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.headers.insert(name.to_ascii_lowercase(), value.into());
        next
    }

    pub fn with_body(&self, body: impl Into<String>) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            headers: self.headers.clone(),
            body: body.into(),
        }
    }

    pub fn with_operation(&self, operation: &Operation) -> Self {
        self.with_body(operation.render())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// The JSON document actually posted. Queries and mutations both travel
    /// under the `query` key.
    pub fn wire_body(&self) -> serde_json::Value {
        json!({ "query": self.body })
    }
}

/// Sends a request and hands back whatever the server said.
///
/// Implementations must return every HTTP status as a [`Response`]; only a
/// failure to obtain a response at all is an error, and it must be
/// [`crate::error::HarnessError::Transport`].
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    fn send(&self, request: &Request) -> Result<Response>;
}
