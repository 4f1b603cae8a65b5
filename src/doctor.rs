//! Connectivity and configuration diagnostics.
//!
//! The doctor command validates the configuration, then probes the endpoint
//! with `query { __typename }` and tells transport problems (nothing came
//! back) apart from HTTP and GraphQL-level problems (something did).

use colored::Colorize;

use crate::client::{HttpTransport, Transport};
use crate::config::{ConfigValidator, HarnessConfig};
use crate::error::{HarnessError, Result};
use crate::query::Operation;

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticResult {
    pub category: String,
    pub check: String,
    pub status: DiagnosticStatus,
    pub message: Option<String>,
    pub solution: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticStatus {
    Ok,
    Warning,
    Error,
}

impl DiagnosticResult {
    fn ok(category: &str, check: impl Into<String>) -> Self {
        Self {
            category: category.to_string(),
            check: check.into(),
            status: DiagnosticStatus::Ok,
            message: None,
            solution: None,
        }
    }

    fn problem(
        status: DiagnosticStatus,
        category: &str,
        check: impl Into<String>,
        message: impl Into<String>,
        solution: impl Into<String>,
    ) -> Self {
        Self {
            category: category.to_string(),
            check: check.into(),
            status,
            message: Some(message.into()),
            solution: Some(solution.into()),
        }
    }
}

pub struct DoctorCommand {
    config: HarnessConfig,
    verbose: bool,
}

impl DoctorCommand {
    pub fn new(config: HarnessConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    pub fn execute(&self) -> Result<()> {
        println!("{}", "🩺 gqlh doctor".blue().bold());
        println!();

        let transport = HttpTransport::new(self.config.timeout())?;
        let results = self.diagnose(&transport);

        let mut has_errors = false;
        for result in &results {
            let symbol = match result.status {
                DiagnosticStatus::Ok => "✓".green(),
                DiagnosticStatus::Warning => "⚠".yellow(),
                DiagnosticStatus::Error => "✗".red(),
            };
            println!("{} {} - {}", symbol, result.category.cyan(), result.check);
            if let Some(message) = &result.message {
                println!("  {}", message.dimmed());
            }
            if let Some(solution) = &result.solution {
                println!("  {} {}", "→ Solution:".green(), solution);
            }
            has_errors |= result.status == DiagnosticStatus::Error;
        }

        println!();
        if has_errors {
            println!("{}", "❌ The endpoint is not ready for a test run".red().bold());
            Err(HarnessError::Other(anyhow::anyhow!(
                "Diagnostics found errors. Fix them before running suites."
            )))
        } else {
            println!("{}", "✅ Ready to run suites".green().bold());
            Ok(())
        }
    }

    /// Runs every check, probing the endpoint through `transport`
    pub fn diagnose(&self, transport: &dyn Transport) -> Vec<DiagnosticResult> {
        let mut results = Vec::new();
        let config_ok = self.check_config(&mut results);
        self.check_identities(&mut results);
        if config_ok {
            self.check_endpoint(transport, &mut results);
        } else {
            results.push(DiagnosticResult::problem(
                DiagnosticStatus::Warning,
                "Endpoint",
                "Probe skipped",
                "The configuration is invalid",
                "Fix the configuration errors above, then run doctor again",
            ));
        }
        results
    }

    fn check_config(&self, results: &mut Vec<DiagnosticResult>) -> bool {
        match ConfigValidator::validate(&self.config) {
            Ok(()) => {
                results.push(DiagnosticResult::ok("Configuration", "Valid"));
                true
            }
            Err(problems) => {
                for problem in problems {
                    results.push(DiagnosticResult::problem(
                        DiagnosticStatus::Error,
                        "Configuration",
                        problem.field.clone(),
                        problem.message,
                        format!("Set {} in the config file or GQLH_{}", problem.field, problem.field.to_ascii_uppercase()),
                    ));
                }
                false
            }
        }
    }

    fn check_identities(&self, results: &mut Vec<DiagnosticResult>) {
        if self.config.uses_tenant_profile() {
            results.push(DiagnosticResult::ok("Identity", "Tenant context headers"));
        }
        if self.config.bearer_profile().is_some() {
            results.push(DiagnosticResult::ok("Identity", "Bearer token"));
        } else {
            results.push(DiagnosticResult::problem(
                DiagnosticStatus::Warning,
                "Identity",
                "Bearer token",
                "No bearer token configured",
                "Tests that call the API as a signed-in user will fail; set GQLH_BEARER_TOKEN",
            ));
        }
    }

    fn check_endpoint(&self, transport: &dyn Transport, results: &mut Vec<DiagnosticResult>) {
        let template = match self.config.request_template() {
            Ok(template) => template,
            Err(e) => {
                results.push(DiagnosticResult::problem(
                    DiagnosticStatus::Error,
                    "Endpoint",
                    "Request",
                    e.to_string(),
                    "Check the endpoint and identity settings",
                ));
                return;
            }
        };

        let probe = Operation::query("__typename");
        if self.verbose {
            eprintln!("Probing {} with {}", self.config.endpoint, probe);
        }

        let endpoint = self.config.endpoint.as_str();
        match transport.send(&template.with_operation(&probe)) {
            Err(e) => results.push(DiagnosticResult::problem(
                DiagnosticStatus::Error,
                "Endpoint",
                format!("Reach {endpoint}"),
                e.to_string(),
                "Check that the server is running and the URL is correct",
            )),
            Ok(response) if !response.ok_status_code() => {
                let solution = match response.http_status() {
                    401 | 403 => "Check the tenant credentials or bearer token",
                    404 => "Check the endpoint path",
                    _ => "Check the server logs",
                };
                results.push(DiagnosticResult::problem(
                    DiagnosticStatus::Error,
                    "Endpoint",
                    format!("HTTP status from {endpoint}"),
                    format!(
                        "HTTP {}: {}",
                        response.http_status(),
                        response.first_error_message().unwrap_or("no GraphQL error")
                    ),
                    solution,
                ));
            }
            Ok(response) if response.raw_body().is_some() => {
                results.push(DiagnosticResult::problem(
                    DiagnosticStatus::Error,
                    "Endpoint",
                    "GraphQL response",
                    "The response body is not a GraphQL envelope",
                    "Point the endpoint at the GraphQL route, not the web app",
                ));
            }
            Ok(response) if response.has_errors() => {
                results.push(DiagnosticResult::problem(
                    DiagnosticStatus::Warning,
                    "Endpoint",
                    "GraphQL response",
                    response.first_error_message().unwrap_or_default().to_string(),
                    "The server is reachable but rejected the probe",
                ));
            }
            Ok(_) => results.push(DiagnosticResult::ok("Endpoint", format!("Reachable ({endpoint})"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockTransport;
    use crate::graphql::Response;
    use serde_json::json;

    fn config() -> HarnessConfig {
        HarnessConfig {
            bearer_token: Some("token".to_string()),
            ..HarnessConfig::default()
        }
    }

    fn endpoint_result(results: &[DiagnosticResult]) -> &DiagnosticResult {
        results.iter().find(|r| r.category == "Endpoint").unwrap()
    }

    #[test]
    fn test_healthy_endpoint() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.body() == "query { __typename }")
            .times(1)
            .returning(|req| Ok(Response::from_value(200, req.body(), json!({"data": {"__typename": "Query"}}))));

        let results = DoctorCommand::new(config(), false).diagnose(&mock);
        assert_eq!(endpoint_result(&results).status, DiagnosticStatus::Ok);
        assert!(results.iter().all(|r| r.status == DiagnosticStatus::Ok));
    }

    #[test]
    fn test_transport_failure_is_error() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .returning(|req| Err(HarnessError::transport(req.endpoint().as_str(), "connection refused")));

        let results = DoctorCommand::new(config(), false).diagnose(&mock);
        let endpoint = endpoint_result(&results);
        assert_eq!(endpoint.status, DiagnosticStatus::Error);
        assert!(endpoint.message.as_deref().unwrap().contains("connection refused"));
    }

    #[test]
    fn test_http_and_application_failures_are_told_apart() {
        let mut unauthorized = MockTransport::new();
        unauthorized
            .expect_send()
            .returning(|req| Ok(Response::from_value(401, req.body(), json!({"errors": [{"message": "denied"}]}))));
        let results = DoctorCommand::new(config(), false).diagnose(&unauthorized);
        let endpoint = endpoint_result(&results);
        assert_eq!(endpoint.status, DiagnosticStatus::Error);
        assert_eq!(endpoint.solution.as_deref(), Some("Check the tenant credentials or bearer token"));

        let mut rejected = MockTransport::new();
        rejected
            .expect_send()
            .returning(|req| Ok(Response::from_value(200, req.body(), json!({"errors": [{"message": "introspection off"}]}))));
        let results = DoctorCommand::new(config(), false).diagnose(&rejected);
        assert_eq!(endpoint_result(&results).status, DiagnosticStatus::Warning);

        let mut html = MockTransport::new();
        html.expect_send()
            .returning(|req| Ok(Response::from_body_text(200, req.body(), "<html></html>")));
        let results = DoctorCommand::new(config(), false).diagnose(&html);
        assert_eq!(endpoint_result(&results).check, "GraphQL response");
        assert_eq!(endpoint_result(&results).status, DiagnosticStatus::Error);
    }

    #[test]
    fn test_invalid_config_skips_probe() {
        let mock = MockTransport::new();
        let results = DoctorCommand::new(HarnessConfig::default(), false).diagnose(&mock);
        assert!(results
            .iter()
            .any(|r| r.category == "Configuration" && r.status == DiagnosticStatus::Error));
        assert_eq!(endpoint_result(&results).check, "Probe skipped");
    }
}
