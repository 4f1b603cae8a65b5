//! Declarative test suites with per-test setup and guaranteed teardown.

use crate::error::{HarnessError, Result};
use crate::lifecycle::EntitySpec;
use crate::logging::log_test_outcome;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

pub mod cases;
pub mod context;
pub mod report;

pub use cases::{nominal_cases, validation_cases, NominalTarget, ValidationTarget};
pub use context::{SuiteEnv, TestContext, TrackedEntity};
pub use report::{CaseReport, CaseStatus, SuiteReport};

pub type Hook = Box<dyn Fn(&mut TestContext) -> Result<()>>;

pub struct TestCase {
    name: String,
    body: Hook,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut TestContext) -> Result<()> + 'static,
    {
        Self {
            name: name.into(),
            body: Box::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A search-or-create fixture prepared before every test in the suite
struct Fixture {
    spec: EntitySpec,
    base_name: String,
}

pub struct Suite {
    name: String,
    description: String,
    fixture: Option<Fixture>,
    before_each: Option<Hook>,
    after_each: Option<Hook>,
    cases: Vec<TestCase>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            fixture: None,
            before_each: None,
            after_each: None,
            cases: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Before each test, search for (or create) an entity named
    /// `"<base_name> <run tag>-<n>"`; after each test, delete it if this run
    /// created it.
    pub fn entity_fixture(mut self, spec: EntitySpec, base_name: impl Into<String>) -> Self {
        self.fixture = Some(Fixture {
            spec,
            base_name: base_name.into(),
        });
        self
    }

    pub fn before_each<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut TestContext) -> Result<()> + 'static,
    {
        self.before_each = Some(Box::new(hook));
        self
    }

    pub fn after_each<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut TestContext) -> Result<()> + 'static,
    {
        self.after_each = Some(Box::new(hook));
        self
    }

    pub fn case<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut TestContext) -> Result<()> + 'static,
    {
        self.cases.push(TestCase::new(name, body));
        self
    }

    pub fn cases(mut self, cases: impl IntoIterator<Item = TestCase>) -> Self {
        self.cases.extend(cases);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn case_names(&self) -> Vec<&str> {
        self.cases.iter().map(TestCase::name).collect()
    }

    /// Runs every case in declaration order. A failing case never stops the
    /// suite.
    pub fn run(&self, env: &SuiteEnv) -> SuiteReport {
        self.run_with(env, |_| {})
    }

    /// As [`Suite::run`], calling `on_case` before each case starts
    pub fn run_with<F>(&self, env: &SuiteEnv, mut on_case: F) -> SuiteReport
    where
        F: FnMut(&str),
    {
        let mut report = SuiteReport::new(&self.name);
        for case in &self.cases {
            on_case(&case.name);
            report.cases.push(self.run_case(env, case));
        }
        report
    }

    fn run_case(&self, env: &SuiteEnv, case: &TestCase) -> CaseReport {
        let started = Instant::now();
        let mut ctx = env.context();

        let (status, message) = match guarded(|| self.setup(&mut ctx)) {
            Err(err) => (CaseStatus::SetupFailed, Some(err.to_string())),
            Ok(()) => match guarded(|| (case.body)(&mut ctx)) {
                Ok(()) => (CaseStatus::Passed, None),
                Err(err) => (CaseStatus::Failed, Some(err.to_string())),
            },
        };

        let teardown_errors = self.teardown(&mut ctx);
        let duration_ms = started.elapsed().as_millis() as u64;
        log_test_outcome(&self.name, &case.name, status == CaseStatus::Passed, duration_ms);

        CaseReport {
            name: case.name.clone(),
            status,
            message,
            duration_ms,
            teardown_errors,
        }
    }

    fn setup(&self, ctx: &mut TestContext) -> Result<()> {
        if let Some(fixture) = &self.fixture {
            let name = ctx.names().next(&fixture.base_name);
            let mut reference = ctx.lifecycle(&fixture.spec).search_or_create(&name)?;
            reference.mark_under_test()?;
            ctx.set_fixture(fixture.spec.clone(), reference);
        }
        if let Some(hook) = &self.before_each {
            hook(ctx)?;
        }
        Ok(())
    }

    /// Always runs, whatever happened before. Errors are reported, not raised.
    fn teardown(&self, ctx: &mut TestContext) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(hook) = &self.after_each {
            if let Err(err) = guarded(|| hook(ctx)) {
                tracing::warn!(suite = self.name.as_str(), error = %err, "after_each failed");
                errors.push(err.to_string());
            }
        }
        match guarded(|| Ok(ctx.teardown_entities())) {
            Ok(failures) => errors.extend(failures.iter().map(ToString::to_string)),
            Err(err) => errors.push(err.to_string()),
        }
        errors
    }
}

/// Runs a step, turning a panic into an ordinary error so teardown still
/// happens.
fn guarded<T, F>(step: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match catch_unwind(AssertUnwindSafe(step)) {
        Ok(result) => result,
        Err(payload) => Err(HarnessError::Other(anyhow::anyhow!(
            "panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{HeaderProfile, MockTransport, Request};
    use crate::graphql::Response;
    use crate::lifecycle::NameGenerator;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use url::Url;

    fn env(mock: MockTransport) -> SuiteEnv {
        let template = Request::template(
            Url::parse("http://localhost:4000/graphql").unwrap(),
            &HeaderProfile::bearer("t"),
        );
        SuiteEnv::new(Arc::new(mock), template).with_names(NameGenerator::with_run_tag("run"))
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&mut TestContext) -> Result<()>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let make = move |label: &str| -> Box<dyn Fn(&mut TestContext) -> Result<()>> {
            let sink = sink.clone();
            let label = label.to_string();
            Box::new(move |_ctx: &mut TestContext| {
                sink.borrow_mut().push(label.clone());
                Ok(())
            })
        };
        (log, make)
    }

    #[test]
    fn test_hooks_wrap_every_case_in_order() {
        let (log, make) = recorder();
        let before = make("before");
        let after = make("after");
        let first = make("first");
        let second = make("second");
        let suite = Suite::new("ordering")
            .before_each(move |ctx| before(ctx))
            .after_each(move |ctx| after(ctx))
            .case("first", move |ctx| first(ctx))
            .case("second", move |ctx| second(ctx));

        let report = suite.run(&env(MockTransport::new()));
        assert!(report.is_success());
        assert_eq!(
            *log.borrow(),
            vec!["before", "first", "after", "before", "second", "after"]
        );
    }

    #[test]
    fn test_teardown_runs_after_failure_and_panic() {
        let (log, make) = recorder();
        let after = make("after");
        let suite = Suite::new("failing")
            .after_each(move |ctx| after(ctx))
            .case("fails", |_ctx| Err(HarnessError::config("x", "boom")))
            .case("panics", |_ctx| panic!("kaboom"))
            .case("passes", |_ctx| Ok(()));

        let report = suite.run(&env(MockTransport::new()));
        assert_eq!(log.borrow().len(), 3);
        assert_eq!(report.case("fails").unwrap().status, CaseStatus::Failed);
        let panicked = report.case("panics").unwrap();
        assert_eq!(panicked.status, CaseStatus::Failed);
        assert!(panicked.message.as_deref().unwrap().contains("kaboom"));
        assert!(report.case("passes").unwrap().passed());
    }

    #[test]
    fn test_setup_failure_skips_body_but_not_teardown() {
        let (log, make) = recorder();
        let body = make("body");
        let after = make("after");
        let suite = Suite::new("setup")
            .before_each(|_ctx| Err(HarnessError::setup("company", "lookup failed")))
            .after_each(move |ctx| after(ctx))
            .case("never runs", move |ctx| body(ctx));

        let report = suite.run(&env(MockTransport::new()));
        assert_eq!(*log.borrow(), vec!["after"]);
        assert_eq!(report.cases[0].status, CaseStatus::SetupFailed);
    }

    #[test]
    fn test_entity_fixture_created_and_deleted() {
        let mut mock = MockTransport::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_send()
            .withf(|req| req.body().contains("companies(search: \"Fixture Co run-1\")"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| Ok(Response::from_value(200, req.body(), json!({"data": {"companies": []}}))));
        mock.expect_send()
            .withf(|req| req.body().starts_with("mutation { upsertCompany"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| {
                Ok(Response::from_value(
                    200,
                    req.body(),
                    json!({"data": {"upsertCompany": {"company": {"id": "c-1", "name1": "Fixture Co run-1"}}}}),
                ))
            });
        mock.expect_send()
            .withf(|req| req.body().starts_with("mutation { deleteCompany(input: {id: \"c-1\"})"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| {
                Ok(Response::from_value(
                    200,
                    req.body(),
                    json!({"data": {"deleteCompany": {"code": "SUCCESS", "error": null}}}),
                ))
            });

        let spec = EntitySpec::new("company", "companies", "upsertCompany")
            .name_field("name1")
            .alt_info_field("company")
            .delete_mutation("deleteCompany");
        let suite = Suite::new("fixture")
            .entity_fixture(spec, "Fixture Co")
            .case("sees fixture", |ctx| {
                assert_eq!(ctx.fixture_id()?, "c-1");
                assert!(ctx.fixture().unwrap().created_by_this_run());
                Ok(())
            });

        let report = suite.run(&env(mock));
        assert!(report.is_success(), "{report:?}");
        assert!(report.cases[0].teardown_errors.is_empty());
    }

    #[test]
    fn test_teardown_error_does_not_change_status() {
        let suite = Suite::new("teardown")
            .after_each(|_ctx| Err(HarnessError::teardown("company", "still referenced")))
            .case("passes", |_ctx| Ok(()));
        let report = suite.run(&env(MockTransport::new()));
        assert!(report.is_success());
        assert_eq!(report.cases[0].teardown_errors.len(), 1);
    }

    #[test]
    fn test_run_with_reports_progress() {
        let suite = Suite::new("progress").case("a", |_| Ok(())).case("b", |_| Ok(()));
        let mut seen = Vec::new();
        suite.run_with(&env(MockTransport::new()), |name| seen.push(name.to_string()));
        assert_eq!(seen, vec!["a", "b"]);
        assert_eq!(suite.case_names(), vec!["a", "b"]);
    }
}
