pub mod commands;
pub mod settings;
pub mod validator;

pub use commands::ConfigCommand;
pub use settings::HarnessConfig;
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
