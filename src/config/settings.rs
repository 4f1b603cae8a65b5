use crate::client::{HeaderProfile, Request, API_KEY_HEADER};
use crate::error::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const ENV_PREFIX: &str = "GQLH_";
pub const CONFIG_FILE_NAME: &str = "config.json";
const REDACTED: &str = "********";

/// Everything a run needs to reach the system under test.
///
/// Layered lowest to highest: built-in defaults, the JSON config file, then
/// `GQLH_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub endpoint: String,
    pub tenant_id: Option<String>,
    pub tenant_secret: Option<String>,
    pub product_id: Option<String>,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub payment_provider_account_id: Option<String>,
    /// Whether the server reports client errors with HTTP 200 plus `errors`
    pub expect_http_200: bool,
    pub timeout_secs: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4000/graphql".to_string(),
            tenant_id: None,
            tenant_secret: None,
            product_id: None,
            api_key: None,
            bearer_token: None,
            username: None,
            password: None,
            payment_provider_account_id: None,
            expect_http_200: true,
            timeout_secs: 30,
        }
    }
}

impl HarnessConfig {
    /// Defaults, then the config file, then the process environment.
    ///
    /// An explicitly named file must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Ok(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };
        config.apply_vars(std::env::vars())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HarnessError::config(path.display().to_string(), format!("Failed to read config: {e}"))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            HarnessError::config(path.display().to_string(), format!("Invalid config JSON: {e}"))
        })
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "gql-harness", "gql-harness")
            .ok_or_else(|| HarnessError::config("path", "Failed to determine config directory"))?;
        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Overlays `GQLH_*` variables. Unknown keys are ignored.
    pub fn apply_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value: String = value.into();
            match name {
                "ENDPOINT" => self.endpoint = value,
                "TENANT_ID" => self.tenant_id = Some(value),
                "TENANT_SECRET" => self.tenant_secret = Some(value),
                "PRODUCT_ID" => self.product_id = Some(value),
                "API_KEY" => self.api_key = Some(value),
                "BEARER_TOKEN" => self.bearer_token = Some(value),
                "USERNAME" => self.username = Some(value),
                "PASSWORD" => self.password = Some(value),
                "PAYMENT_PROVIDER_ACCOUNT_ID" => self.payment_provider_account_id = Some(value),
                "EXPECT_HTTP_200" => self.expect_http_200 = parse_bool(name, &value)?,
                "TIMEOUT_SECS" => {
                    self.timeout_secs = value.trim().parse().map_err(|_| {
                        HarnessError::config(key.as_ref(), format!("Not a number of seconds: {value}"))
                    })?
                }
                _ => tracing::debug!(key = key.as_ref(), "Ignoring unknown setting"),
            }
        }
        Ok(())
    }

    /// Writes the config through a temp file so a crash never leaves a
    /// truncated file behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        file.persist(path)
            .map_err(|e| HarnessError::config(path.display().to_string(), e.to_string()))?;
        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        Url::parse(&self.endpoint)
            .map_err(|e| HarnessError::config("endpoint", format!("Invalid URL {}: {e}", self.endpoint)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn tenant_profile(&self) -> Result<HeaderProfile> {
        let field = |value: &Option<String>, name: &str| {
            value
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| HarnessError::config(name, "Required for the tenant profile"))
        };
        Ok(HeaderProfile::tenant(
            field(&self.tenant_id, "tenant_id")?,
            field(&self.tenant_secret, "tenant_secret")?,
            field(&self.product_id, "product_id")?,
        ))
    }

    pub fn bearer_profile(&self) -> Option<HeaderProfile> {
        self.bearer_token
            .as_ref()
            .filter(|t| !t.trim().is_empty())
            .map(HeaderProfile::bearer)
    }

    /// Tenant context when a tenant id is configured, otherwise the bearer token
    pub fn default_profile(&self) -> Result<HeaderProfile> {
        if self.uses_tenant_profile() {
            return self.tenant_profile();
        }
        self.bearer_profile().ok_or_else(|| {
            HarnessError::config(
                "tenant_id",
                "Neither tenant credentials nor a bearer token are configured",
            )
        })
    }

    pub fn uses_tenant_profile(&self) -> bool {
        self.tenant_id.as_ref().is_some_and(|t| !t.trim().is_empty())
    }

    pub fn request_template(&self) -> Result<Request> {
        let template = Request::template(self.endpoint_url()?, &self.default_profile()?);
        Ok(match &self.api_key {
            Some(key) if !key.is_empty() => template.with_header(API_KEY_HEADER, key.clone()),
            _ => template,
        })
    }

    /// Feature-specific ids made available to suites by key
    pub fn feature_ids(&self) -> BTreeMap<String, String> {
        let mut ids = BTreeMap::new();
        if let Some(id) = &self.payment_provider_account_id {
            ids.insert("payment_provider_account_id".to_string(), id.clone());
        }
        ids
    }

    /// A copy safe to print: secrets are masked
    pub fn redacted(&self) -> Self {
        let mask = |value: &Option<String>| value.as_ref().map(|_| REDACTED.to_string());
        Self {
            tenant_secret: mask(&self.tenant_secret),
            api_key: mask(&self.api_key),
            bearer_token: mask(&self.bearer_token),
            password: mask(&self.password),
            ..self.clone()
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(HarnessError::config(
            format!("{ENV_PREFIX}{name}"),
            format!("Not a boolean: {value}"),
        )),
    }
}
