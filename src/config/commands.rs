//! `gqlh config show|path|init`

use colored::Colorize;
use dialoguer::{Confirm, Input, Password};
use std::path::{Path, PathBuf};

use super::{ConfigValidator, HarnessConfig};
use crate::error::{HarnessError, Result};

pub struct ConfigCommand {
    path: PathBuf,
}

impl ConfigCommand {
    /// Operates on `path`, or the per-user default location
    pub fn new(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => HarnessConfig::default_path()?,
        };
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The effective configuration with secrets masked, as pretty JSON
    pub fn render(config: &HarnessConfig) -> Result<String> {
        Ok(serde_json::to_string_pretty(&config.redacted())?)
    }

    pub fn show(&self, config: &HarnessConfig) -> Result<()> {
        println!("{} {}", "Config file:".blue(), self.path.display());
        println!("{}", Self::render(config)?);
        if let Err(problems) = ConfigValidator::validate(config) {
            println!();
            for problem in problems {
                println!("{} {}", "⚠".yellow(), problem);
            }
        }
        Ok(())
    }

    /// Prompts for every setting, starting from `current`, and saves the result
    pub fn init(&self, current: &HarnessConfig) -> Result<()> {
        println!("{}", "Configure gql-harness".blue().bold());
        println!("Leave optional values empty to skip them.");
        println!();

        let endpoint: String = Input::new()
            .with_prompt("GraphQL endpoint")
            .default(current.endpoint.clone())
            .interact_text()?;
        let tenant_id = optional("Tenant id", &current.tenant_id)?;
        let (tenant_secret, product_id) = if tenant_id.is_some() {
            let secret: String = Password::new()
                .with_prompt("Tenant secret")
                .interact()?;
            (Some(secret), optional("Product id", &current.product_id)?)
        } else {
            (None, None)
        };
        let bearer_token = Some(
            Password::new()
                .with_prompt("Bearer token (empty for none)")
                .allow_empty_password(true)
                .interact()?,
        )
        .filter(|t| !t.is_empty());
        let api_key = optional("API key", &current.api_key)?;
        let payment_provider_account_id =
            optional("Payment provider account id", &current.payment_provider_account_id)?;
        let expect_http_200 = Confirm::new()
            .with_prompt("Does the server report validation errors with HTTP 200?")
            .default(current.expect_http_200)
            .interact()?;

        let config = HarnessConfig {
            endpoint,
            tenant_id,
            tenant_secret,
            product_id,
            api_key,
            bearer_token,
            payment_provider_account_id,
            expect_http_200,
            ..current.clone()
        };

        if let Err(problems) = ConfigValidator::validate(&config) {
            for problem in &problems {
                println!("{} {}", "⚠".yellow(), problem);
            }
            let save_anyway = Confirm::new()
                .with_prompt("Save anyway?")
                .default(false)
                .interact()?;
            if !save_anyway {
                return Err(HarnessError::config("config", "Configuration not saved"));
            }
        }

        config.save(&self.path)?;
        println!("{} Saved {}", "✓".green(), self.path.display());
        Ok(())
    }
}

fn optional(prompt: &str, current: &Option<String>) -> Result<Option<String>> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .default(current.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;
    Ok(Some(value.trim().to_string()).filter(|v| !v.is_empty()))
}
