use colored::Colorize;
use std::fmt;

pub mod builder;

pub use builder::ErrorBuilder;

/// A judgment mismatch between a response and what a test expected of it.
///
/// Carries the submitted query text and the first server error so a failing
/// test can be diagnosed without re-running it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    pub operation: String,
    pub reason: String,
    pub query: String,
    pub http_status: Option<u16>,
    pub first_error: Option<String>,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation, self.reason)?;
        if let Some(status) = self.http_status {
            write!(f, " (HTTP {status})")?;
        }
        if let Some(error) = &self.first_error {
            write!(f, "; first error: {error}")?;
        }
        write!(f, "; query: {}", self.query)
    }
}

impl std::error::Error for AssertionFailure {}

#[derive(Debug)]
pub enum HarnessError {
    /// The request never produced an HTTP response (refused, DNS, timeout).
    Transport {
        endpoint: String,
        message: String,
    },
    Assertion(Box<AssertionFailure>),
    Setup {
        entity: String,
        message: String,
    },
    Teardown {
        entity: String,
        message: String,
    },
    Lifecycle {
        entity: String,
        message: String,
    },
    Config {
        field: String,
        message: String,
    },
    Other(anyhow::Error),
}

impl HarnessError {
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn setup(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Setup {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub fn teardown(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Teardown {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub fn lifecycle(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lifecycle {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }

    pub fn assertion(&self) -> Option<&AssertionFailure> {
        match self {
            Self::Assertion(failure) => Some(failure.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { endpoint, message } => {
                write!(
                    f,
                    "{} Transport failure talking to {}: {}",
                    "✗".red().bold(),
                    endpoint.yellow(),
                    message
                )
            }
            Self::Assertion(failure) => {
                write!(f, "{} Assertion failed: {}", "✗".red().bold(), failure)
            }
            Self::Setup { entity, message } => {
                write!(
                    f,
                    "{} Setup failed for {}: {}",
                    "✗".red().bold(),
                    entity.yellow(),
                    message
                )
            }
            Self::Teardown { entity, message } => {
                write!(
                    f,
                    "{} Teardown failed for {}: {}",
                    "⚠".yellow().bold(),
                    entity.yellow(),
                    message
                )
            }
            Self::Lifecycle { entity, message } => {
                write!(
                    f,
                    "{} Invalid lifecycle step for {}: {}",
                    "✗".red().bold(),
                    entity.yellow(),
                    message
                )
            }
            Self::Config { field, message } => {
                write!(
                    f,
                    "{} Configuration error in {}: {}",
                    "✗".red().bold(),
                    field.yellow(),
                    message
                )
            }
            Self::Other(err) => write!(f, "{} {}", "✗".red().bold(), err),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Assertion(failure) => Some(failure.as_ref()),
            Self::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<AssertionFailure> for HarnessError {
    fn from(failure: AssertionFailure) -> Self {
        Self::Assertion(Box::new(failure))
    }
}

impl From<anyhow::Error> for HarnessError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err)
    }
}

impl From<std::io::Error> for HarnessError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(anyhow::Error::new(err))
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(anyhow::anyhow!("JSON error: {}", err))
    }
}

impl From<dialoguer::Error> for HarnessError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Other(anyhow::anyhow!("Dialog error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
