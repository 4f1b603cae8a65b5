//! End-to-end test harness for a GraphQL API.
//!
//! Sends queries and mutations over HTTP with tenant or bearer headers,
//! judges responses with reusable assertions, manages fixture entities
//! around each test, and runs declarative suites that always tear down
//! what they created.

pub mod assertions;
pub mod client;
pub mod config;
pub mod doctor;
pub mod error;
pub mod graphql;
pub mod lifecycle;
pub mod logging;
pub mod poll;
pub mod query;
pub mod runner;
pub mod suite;
pub mod suites;

#[cfg(any(test, debug_assertions))]
pub mod test_utils;

pub use client::{HeaderProfile, HttpTransport, Request, Transport};
pub use config::HarnessConfig;
pub use error::{AssertionFailure, HarnessError, Result};
pub use graphql::Response;
pub use query::{InputObject, InputValue, Operation};
pub use runner::{RunSummary, SuiteRunner};
pub use suite::{Suite, SuiteEnv, SuiteReport, TestContext};
