//! Generated test-case groups shared by every suite.

use super::{TestCase, TestContext};
use crate::assertions::{confirm_error, confirm_success};
use crate::error::Result;
use crate::lifecycle::{EntityReference, EntitySpec};
use crate::query::{InputObject, InputValue, Operation, OperationKind};
use std::rc::Rc;

/// The operation whose input validation is exercised
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationTarget {
    pub kind: OperationKind,
    pub field: String,
    pub argument: String,
    /// A string/id input field that will be sent a boolean instead
    pub mismatch_field: String,
    pub selection: Vec<String>,
}

impl ValidationTarget {
    pub fn mutation(field: impl Into<String>, mismatch_field: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Mutation,
            field: field.into(),
            argument: "input".to_string(),
            mismatch_field: mismatch_field.into(),
            selection: Vec::new(),
        }
    }

    pub fn argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = argument.into();
        self
    }

    pub fn select<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.extend(paths.into_iter().map(Into::into));
        self
    }

    fn base(&self) -> Operation {
        Operation::new(self.kind, &self.field).select_all(&self.selection)
    }
}

/// Zero-argument, empty-input and type-mismatch cases. Each expects an
/// error and no data, under whichever status contract the run is
/// configured for.
pub fn validation_cases(target: &ValidationTarget) -> Vec<TestCase> {
    let field = &target.field;
    vec![
        expect_rejected(
            format!("{field} rejects a call without arguments"),
            target.base(),
        ),
        expect_rejected(
            format!("{field} rejects an empty {}", target.argument),
            target.base().arg(&target.argument, InputObject::new()),
        ),
        expect_rejected(
            format!("{field} rejects a boolean {}", target.mismatch_field),
            target.base().arg(
                &target.argument,
                InputObject::new().field(&target.mismatch_field, InputValue::Bool(true)),
            ),
        ),
    ]
}

fn expect_rejected(name: String, operation: Operation) -> TestCase {
    let field = operation.field_name().to_string();
    TestCase::new(name, move |ctx| {
        let response = ctx.send(&operation)?;
        confirm_error(&response, &field, ctx.expect_http_200())?;
        Ok(())
    })
}

pub type InputFn = Rc<dyn Fn(&TestContext) -> Result<InputObject>>;

/// The success path of an operation with a minimal and a full selection
#[derive(Clone)]
pub struct NominalTarget {
    pub kind: OperationKind,
    pub field: String,
    pub argument: String,
    pub input: InputFn,
    pub minimal: Vec<String>,
    pub full: Vec<String>,
    /// Entities the operation creates, deleted again in teardown
    pub track: Option<EntitySpec>,
}

impl NominalTarget {
    pub fn mutation<F>(field: impl Into<String>, input: F) -> Self
    where
        F: Fn(&TestContext) -> Result<InputObject> + 'static,
    {
        Self {
            kind: OperationKind::Mutation,
            field: field.into(),
            argument: "input".to_string(),
            input: Rc::new(input),
            minimal: Vec::new(),
            full: Vec::new(),
            track: None,
        }
    }

    pub fn minimal<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.minimal = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn full<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.full = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn track(mut self, spec: EntitySpec) -> Self {
        self.track = Some(spec);
        self
    }
}

pub fn nominal_cases(target: &NominalTarget) -> Vec<TestCase> {
    vec![
        expect_success(
            format!("{} succeeds with a minimal selection", target.field),
            target.clone(),
            target.minimal.clone(),
        ),
        expect_success(
            format!("{} succeeds with the full selection", target.field),
            target.clone(),
            target.full.clone(),
        ),
    ]
}

fn expect_success(name: String, target: NominalTarget, mut selection: Vec<String>) -> TestCase {
    if let Some(spec) = &target.track {
        let id_path = spec.payload_path(&spec.id_field);
        if !selection.contains(&id_path) {
            selection.push(id_path);
        }
    }
    TestCase::new(name, move |ctx| {
        let input = (target.input)(&*ctx)?;
        let operation = Operation::new(target.kind, &target.field)
            .arg(&target.argument, input.clone())
            .select_all(&selection);
        let response = ctx.send(&operation)?;

        // Tracked before any assertion so a partial payload is still torn down
        if let Some(spec) = &target.track {
            let created = ctx.lifecycle(spec).payload_id(&response, &target.field);
            if let Some(id) = created {
                let name = input
                    .get(&spec.name_field)
                    .and_then(InputValue::as_str)
                    .unwrap_or_default()
                    .to_string();
                ctx.track(spec.clone(), EntityReference::created(id, name));
            }
        }
        confirm_success(&response, &target.field, &selection)?;
        Ok(())
    })
}
