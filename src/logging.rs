use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives read before `RUST_LOG`
pub const LOG_ENV: &str = "GQLH_LOG";

/// Initialize structured logging on stderr, leaving stdout to reports.
///
/// `GQLH_LOG`, then `RUST_LOG`, override the verbosity default.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_directives = if verbose {
        "gql_harness=debug,info"
    } else {
        "gql_harness=info,warn"
    };
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!(filter = default_directives, "Logging initialized");
    Ok(())
}

/// Log HTTP requests
pub fn log_http_request(method: &str, url: &str, status: Option<u16>) {
    if let Some(status_code) = status {
        tracing::debug!(
            method = method,
            url = url,
            status = status_code,
            "HTTP request completed"
        );
    } else {
        tracing::debug!(method = method, url = url, "HTTP request initiated");
    }
}

/// Log fixture entity lifecycle steps (found, created, deleted, kept)
pub fn log_entity_lifecycle(entity: &str, id: &str, action: &str) {
    tracing::info!(entity = entity, id = id, action = action, "Entity lifecycle");
}

/// Log the outcome of a single test case
pub fn log_test_outcome(suite: &str, test: &str, passed: bool, duration_ms: u64) {
    if passed {
        tracing::info!(
            suite = suite,
            test = test,
            duration_ms = duration_ms,
            "Test passed"
        );
    } else {
        tracing::error!(
            suite = suite,
            test = test,
            duration_ms = duration_ms,
            "Test failed"
        );
    }
}

/// Log performance metrics
pub fn log_performance(operation: &str, duration_ms: u64) {
    tracing::debug!(
        operation = operation,
        duration_ms = duration_ms,
        "Operation performance"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_verbose() {
        // It might fail if already initialized, which is ok
        let _ = init_logging(true);
    }

    #[test]
    fn test_init_logging_normal() {
        let _ = init_logging(false);
    }

    #[test]
    fn test_logging_functions() {
        log_http_request("POST", "https://example.com/graphql", Some(200));
        log_http_request("POST", "https://example.com/graphql", None);
        log_entity_lifecycle("company", "c-1", "created");
        log_test_outcome("company", "round trip", true, 12);
        log_test_outcome("company", "round trip", false, 12);
        log_performance("graphql_request", 150);
    }
}
