//! Common test utilities for harness tests
//!
//! An in-process GraphQL server and a stateful fake backend, shared by the
//! unit tests and the integration tests under `tests/`.

#[cfg(any(test, debug_assertions))]
pub mod fake_server;

#[cfg(any(test, debug_assertions))]
pub mod fixtures;
