use super::HarnessConfig;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a harness configuration, reporting every problem at once
    pub fn validate(config: &HarnessConfig) -> ValidationResult {
        let mut errors = Vec::new();

        if let Err(message) = Self::validate_endpoint(&config.endpoint) {
            errors.push(ValidationError {
                field: "endpoint".to_string(),
                message,
            });
        }

        if config.uses_tenant_profile() {
            for (field, value) in [
                ("tenant_secret", &config.tenant_secret),
                ("product_id", &config.product_id),
            ] {
                if value.as_ref().is_none_or(|v| v.trim().is_empty()) {
                    errors.push(ValidationError {
                        field: field.to_string(),
                        message: "Required when tenant_id is set".to_string(),
                    });
                }
            }
        } else if config.bearer_profile().is_none() {
            errors.push(ValidationError {
                field: "tenant_id".to_string(),
                message: "Configure tenant_id/tenant_secret/product_id or bearer_token".to_string(),
            });
        }

        if config.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "timeout_secs".to_string(),
                message: "Timeout must be greater than zero".to_string(),
            });
        }

        for (field, value) in [
            ("tenant_id", &config.tenant_id),
            ("tenant_secret", &config.tenant_secret),
            ("product_id", &config.product_id),
            ("api_key", &config.api_key),
            ("bearer_token", &config.bearer_token),
        ] {
            if let Some(value) = value {
                if value.chars().any(|c| c.is_control()) {
                    errors.push(ValidationError {
                        field: field.to_string(),
                        message: "Header values cannot contain control characters".to_string(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_endpoint(endpoint: &str) -> Result<(), String> {
        let url = Url::parse(endpoint).map_err(|e| format!("Invalid URL: {e}"))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(format!("Unsupported scheme: {other}")),
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err("URL has no host".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> HarnessConfig {
        HarnessConfig {
            endpoint: "https://api.example.test/graphql".to_string(),
            tenant_id: Some("t".to_string()),
            tenant_secret: Some("s".to_string()),
            product_id: Some("p".to_string()),
            ..HarnessConfig::default()
        }
    }

    fn fields(result: ValidationResult) -> Vec<String> {
        result.unwrap_err().into_iter().map(|e| e.field).collect()
    }

    #[test]
    fn test_valid_config() {
        assert!(ConfigValidator::validate(&valid()).is_ok());
    }

    #[test]
    fn test_bearer_only_is_valid() {
        let config = HarnessConfig {
            bearer_token: Some("tok".to_string()),
            ..HarnessConfig::default()
        };
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_reports_all_problems() {
        let config = HarnessConfig {
            endpoint: "ftp://files.example.test".to_string(),
            tenant_secret: None,
            product_id: Some(" ".to_string()),
            timeout_secs: 0,
            ..valid()
        };
        let fields = fields(ConfigValidator::validate(&config));
        assert!(fields.contains(&"endpoint".to_string()));
        assert!(fields.contains(&"tenant_secret".to_string()));
        assert!(fields.contains(&"product_id".to_string()));
        assert!(fields.contains(&"timeout_secs".to_string()));
    }

    #[test]
    fn test_no_credentials() {
        let fields = fields(ConfigValidator::validate(&HarnessConfig::default()));
        assert_eq!(fields, vec!["tenant_id".to_string()]);
    }

    #[test]
    fn test_invalid_endpoints() {
        for endpoint in ["not-a-url", "mailto:someone@example.test", "http://"] {
            let config = HarnessConfig {
                endpoint: endpoint.to_string(),
                ..valid()
            };
            assert!(
                ConfigValidator::validate(&config).is_err(),
                "accepted {endpoint}"
            );
        }
    }

    #[test]
    fn test_control_characters_rejected() {
        let config = HarnessConfig {
            tenant_secret: Some("abc\r\nx-injected: 1".to_string()),
            ..valid()
        };
        assert_eq!(
            fields(ConfigValidator::validate(&config)),
            vec!["tenant_secret".to_string()]
        );
    }
}
