use crate::client::{HeaderProfile, Request, Transport};
use crate::error::{HarnessError, Result};
use crate::graphql::Response;
use crate::lifecycle::{EntityLifecycle, EntityReference, EntitySpec, NameGenerator};
use crate::query::Operation;
use std::collections::BTreeMap;
use std::sync::Arc;

/// What every test in a run shares: where to send requests and how.
#[derive(Clone)]
pub struct SuiteEnv {
    pub transport: Arc<dyn Transport>,
    pub template: Request,
    pub names: NameGenerator,
    pub expect_http_200: bool,
    pub feature_ids: BTreeMap<String, String>,
    pub bearer: Option<HeaderProfile>,
}

impl SuiteEnv {
    pub fn new(transport: Arc<dyn Transport>, template: Request) -> Self {
        Self {
            transport,
            template,
            names: NameGenerator::new(),
            expect_http_200: true,
            feature_ids: BTreeMap::new(),
            bearer: None,
        }
    }

    pub fn with_names(mut self, names: NameGenerator) -> Self {
        self.names = names;
        self
    }

    pub fn expect_http_200(mut self, expect: bool) -> Self {
        self.expect_http_200 = expect;
        self
    }

    pub fn feature_id(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.feature_ids.insert(key.into(), value.into());
        self
    }

    pub fn bearer(mut self, profile: HeaderProfile) -> Self {
        self.bearer = Some(profile);
        self
    }

    pub(crate) fn context(&self) -> TestContext {
        TestContext {
            env: self.clone(),
            fixture: None,
            tracked: Vec::new(),
        }
    }
}

/// An entity the test is responsible for, with the [`EntitySpec`] needed to delete it
#[derive(Debug, Clone)]
pub struct TrackedEntity {
    pub spec: EntitySpec,
    pub reference: EntityReference,
}

/// Per-test state threaded through setup, body and teardown.
///
/// A fresh context is built for every test case, so nothing leaks from one
/// test into the next.
pub struct TestContext {
    env: SuiteEnv,
    fixture: Option<TrackedEntity>,
    tracked: Vec<TrackedEntity>,
}

impl TestContext {
    pub fn transport(&self) -> &dyn Transport {
        self.env.transport.as_ref()
    }

    pub fn template(&self) -> &Request {
        &self.env.template
    }

    pub fn names(&self) -> &NameGenerator {
        &self.env.names
    }

    pub fn expect_http_200(&self) -> bool {
        self.env.expect_http_200
    }

    pub fn feature_id(&self, key: &str) -> Result<&str> {
        self.env
            .feature_ids
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| HarnessError::config(key, "Not configured for this run"))
    }

    pub fn send(&self, operation: &Operation) -> Result<Response> {
        self.send_text(&operation.render())
    }

    /// Sends hand-written query text as-is
    pub fn send_text(&self, text: &str) -> Result<Response> {
        self.env.transport.send(&self.env.template.with_body(text))
    }

    /// Sends with the bearer profile instead of the run's default identity
    pub fn send_as_bearer(&self, operation: &Operation) -> Result<Response> {
        let profile = self
            .env
            .bearer
            .as_ref()
            .ok_or_else(|| HarnessError::config("bearer_token", "No bearer token configured"))?;
        let request = self.env.template.with_profile(profile).with_operation(operation);
        self.env.transport.send(&request)
    }

    pub fn lifecycle<'a>(&'a self, spec: &'a EntitySpec) -> EntityLifecycle<'a> {
        EntityLifecycle::new(self.env.transport.as_ref(), &self.env.template, spec)
    }

    pub fn fixture(&self) -> Option<&EntityReference> {
        self.fixture.as_ref().map(|f| &f.reference)
    }

    pub fn fixture_mut(&mut self) -> Option<&mut EntityReference> {
        self.fixture.as_mut().map(|f| &mut f.reference)
    }

    /// The fixture's id, failing the test when setup left none
    pub fn fixture_id(&self) -> Result<String> {
        self.fixture()
            .map(|f| f.id().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| HarnessError::lifecycle("fixture", "no fixture entity in this test"))
    }

    pub fn set_fixture(&mut self, spec: EntitySpec, reference: EntityReference) {
        self.fixture = Some(TrackedEntity { spec, reference });
    }

    /// Deletes the fixture from inside the test body; teardown then has
    /// nothing left to do for it.
    pub fn delete_fixture(&mut self) -> Result<()> {
        let Some(mut fixture) = self.fixture.take() else {
            return Err(HarnessError::lifecycle("fixture", "no fixture entity in this test"));
        };
        let result = EntityLifecycle::new(self.env.transport.as_ref(), &self.env.template, &fixture.spec)
            .delete(&mut fixture.reference);
        self.fixture = Some(fixture);
        result
    }

    /// Registers an entity created in the test body for teardown
    pub fn track(&mut self, spec: EntitySpec, reference: EntityReference) {
        self.tracked.push(TrackedEntity { spec, reference });
    }

    pub fn tracked(&self) -> &[TrackedEntity] {
        &self.tracked
    }

    /// Deletes what this test created: tracked entities newest first, then
    /// the fixture. Failures are collected, never raised.
    pub(crate) fn teardown_entities(&mut self) -> Vec<HarnessError> {
        let mut pending: Vec<TrackedEntity> = self.tracked.drain(..).rev().collect();
        pending.extend(self.fixture.take());

        let mut errors = Vec::new();
        for mut tracked in pending {
            let lifecycle =
                EntityLifecycle::new(self.env.transport.as_ref(), &self.env.template, &tracked.spec);
            if let Some(err) = lifecycle.teardown(&mut tracked.reference) {
                errors.push(err);
            }
        }
        errors
    }
}
