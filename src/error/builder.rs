use super::{AssertionFailure, HarnessError};
use crate::graphql::Response;

/// Builder for creating harness errors with less duplication
pub struct ErrorBuilder;

impl ErrorBuilder {
    /// Starts an assertion failure for the given operation
    pub fn assertion(operation: &str) -> AssertionFailureBuilder {
        AssertionFailureBuilder {
            operation: operation.to_string(),
            reason: String::new(),
            query: String::new(),
            http_status: None,
            first_error: None,
        }
    }

    /// Creates a setup error naming the entity whose fixture could not be prepared
    pub fn setup(entity: &str) -> LifecycleErrorBuilder {
        LifecycleErrorBuilder {
            entity: entity.to_string(),
            message: String::new(),
            query: None,
            phase: Phase::Setup,
        }
    }

    pub fn teardown(entity: &str) -> LifecycleErrorBuilder {
        LifecycleErrorBuilder {
            entity: entity.to_string(),
            message: String::new(),
            query: None,
            phase: Phase::Teardown,
        }
    }
}

pub struct AssertionFailureBuilder {
    operation: String,
    reason: String,
    query: String,
    http_status: Option<u16>,
    first_error: Option<String>,
}

impl AssertionFailureBuilder {
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Copies the submitted query, status and first error from a response
    pub fn response(mut self, response: &Response) -> Self {
        self.query = response.query().to_string();
        self.http_status = Some(response.http_status());
        self.first_error = response.first_error_message().map(str::to_string);
        self
    }

    pub fn build(self) -> AssertionFailure {
        AssertionFailure {
            operation: self.operation,
            reason: self.reason,
            query: self.query,
            http_status: self.http_status,
            first_error: self.first_error,
        }
    }

    pub fn into_error(self) -> HarnessError {
        self.build().into()
    }
}

enum Phase {
    Setup,
    Teardown,
}

pub struct LifecycleErrorBuilder {
    entity: String,
    message: String,
    query: Option<String>,
    phase: Phase,
}

impl LifecycleErrorBuilder {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn build(self) -> HarnessError {
        let message = match self.query {
            Some(query) => format!("{} (query: {})", self.message, query),
            None => self.message,
        };
        match self.phase {
            Phase::Setup => HarnessError::setup(self.entity, message),
            Phase::Teardown => HarnessError::teardown(self.entity, message),
        }
    }
}
