//! Runs suites against a configured endpoint and collects their reports.

use crate::client::{HttpTransport, Transport};
use crate::config::{ConfigValidator, HarnessConfig};
use crate::error::{HarnessError, Result};
use crate::suite::{Suite, SuiteEnv, SuiteReport};
use crate::suites::{builtin_suites, find_suite, suite_names};
use chrono::{DateTime, Utc};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Reports for every suite in one invocation
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_tag: String,
    pub started_at: DateTime<Utc>,
    pub suites: Vec<SuiteReport>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.suites.iter().map(SuiteReport::passed).sum()
    }

    pub fn failed(&self) -> usize {
        self.suites.iter().map(SuiteReport::failed).sum()
    }

    pub fn is_success(&self) -> bool {
        self.suites.iter().all(SuiteReport::is_success)
    }

    pub fn print(&self) {
        for report in &self.suites {
            report.print();
            println!();
        }
        let line = format!(
            "Run {}: {} passed, {} failed",
            self.run_tag,
            self.passed(),
            self.failed()
        );
        if self.is_success() {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line.red().bold());
        }
    }
}

pub struct SuiteRunner {
    env: SuiteEnv,
    show_progress: bool,
}

impl SuiteRunner {
    pub fn new(env: SuiteEnv) -> Self {
        Self {
            env,
            show_progress: false,
        }
    }

    /// Validates `config` and wires an HTTP transport from it
    pub fn from_config(config: &HarnessConfig) -> Result<Self> {
        if let Err(problems) = ConfigValidator::validate(config) {
            let message = problems
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(HarnessError::config("config", message));
        }

        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.timeout())?);
        let mut env = SuiteEnv::new(transport, config.request_template()?)
            .expect_http_200(config.expect_http_200);
        for (key, value) in config.feature_ids() {
            env = env.feature_id(key, value);
        }
        if let Some(profile) = config.bearer_profile() {
            env = env.bearer(profile);
        }
        Ok(Self::new(env))
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn env(&self) -> &SuiteEnv {
        &self.env
    }

    pub fn run_suite(&self, suite: &Suite) -> SuiteReport {
        tracing::info!(suite = suite.name(), run_tag = self.env.names.run_tag(), "Running suite");
        if !self.show_progress {
            return suite.run(&self.env);
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {prefix:.bold} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_prefix(suite.name().to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        let report = suite.run_with(&self.env, |case| spinner.set_message(case.to_string()));
        spinner.finish_and_clear();
        report
    }

    pub fn run_all(&self, suites: &[Suite]) -> RunSummary {
        let started_at = Utc::now();
        let reports = suites.iter().map(|suite| self.run_suite(suite)).collect();
        RunSummary {
            run_tag: self.env.names.run_tag().to_string(),
            started_at,
            suites: reports,
        }
    }
}

/// The named suites, or every built-in suite when `names` is empty
pub fn resolve_suites(names: &[String]) -> Result<Vec<Suite>> {
    if names.is_empty() {
        return Ok(builtin_suites());
    }
    names
        .iter()
        .map(|name| {
            find_suite(name).ok_or_else(|| {
                HarnessError::config(
                    "suite",
                    format!("Unknown suite '{name}' (available: {})", suite_names().join(", ")),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{HeaderProfile, MockTransport, Request};
    use crate::lifecycle::NameGenerator;
    use url::Url;

    fn env() -> SuiteEnv {
        let template = Request::template(
            Url::parse("http://localhost:4000/graphql").unwrap(),
            &HeaderProfile::bearer("t"),
        );
        SuiteEnv::new(Arc::new(MockTransport::new()), template).with_names(NameGenerator::with_run_tag("abc"))
    }

    #[test]
    fn test_resolve_suites() {
        assert_eq!(resolve_suites(&[]).unwrap().len(), suite_names().len());
        let picked = resolve_suites(&["company".to_string()]).unwrap();
        assert_eq!(picked[0].name(), "company");

        let err = resolve_suites(&["refund".to_string()]).err().unwrap();
        assert!(err.to_string().contains("Unknown suite 'refund'"));
    }

    #[test]
    fn test_run_all_aggregates_reports() {
        let suites = vec![
            Suite::new("one").case("ok", |_| Ok(())),
            Suite::new("two")
                .case("ok", |_| Ok(()))
                .case("bad", |_| Err(HarnessError::config("x", "nope"))),
        ];
        let summary = SuiteRunner::new(env()).run_all(&suites);
        assert_eq!(summary.run_tag, "abc");
        assert_eq!(summary.passed(), 2);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let config = HarnessConfig {
            endpoint: "ftp://example.com".to_string(),
            bearer_token: Some("t".to_string()),
            ..HarnessConfig::default()
        };
        let err = SuiteRunner::from_config(&config).err().unwrap();
        assert!(matches!(err, HarnessError::Config { .. }));
    }

    #[test]
    fn test_from_config_carries_feature_ids_and_bearer() {
        let config = HarnessConfig {
            tenant_id: Some("tenant".to_string()),
            tenant_secret: Some("secret".to_string()),
            product_id: Some("product".to_string()),
            bearer_token: Some("token".to_string()),
            payment_provider_account_id: Some("acct-1".to_string()),
            expect_http_200: false,
            ..HarnessConfig::default()
        };
        let runner = SuiteRunner::from_config(&config).unwrap();
        let env = runner.env();
        assert!(!env.expect_http_200);
        assert_eq!(env.feature_ids.get("payment_provider_account_id").map(String::as_str), Some("acct-1"));
        assert_eq!(env.bearer, Some(HeaderProfile::bearer("token")));
        assert_eq!(env.template.header("x-tenant-id"), Some("tenant"));
    }
}
