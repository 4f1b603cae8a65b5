#![allow(dead_code)]

use gql_harness::client::{HeaderProfile, HttpTransport, Request, Transport};
use gql_harness::lifecycle::NameGenerator;
use gql_harness::suite::SuiteEnv;
use gql_harness::test_utils::fake_server::FakeGraphQlServer;
use std::sync::Arc;
use std::time::Duration;

pub fn tenant_profile() -> HeaderProfile {
    HeaderProfile::tenant("tenant-1", "secret-1", "product-1")
}

/// Request template pointed at a fake server with tenant headers
pub fn template_for(server: &FakeGraphQlServer) -> Request {
    Request::template(server.endpoint(), &tenant_profile())
}

pub fn http_transport() -> Arc<dyn Transport> {
    Arc::new(HttpTransport::new(Duration::from_secs(5)).expect("Failed to build transport"))
}

/// A suite environment that talks HTTP to `server`
pub fn env_for(server: &FakeGraphQlServer) -> SuiteEnv {
    SuiteEnv::new(http_transport(), template_for(server)).with_names(NameGenerator::with_run_tag("itest"))
}

/// Common assertion helper for error messages
pub fn assert_error_contains(error_string: &str, expected_messages: &[&str]) {
    for msg in expected_messages {
        assert!(
            error_string.contains(msg),
            "Expected error to contain '{msg}', but got: {error_string}"
        );
    }
}
