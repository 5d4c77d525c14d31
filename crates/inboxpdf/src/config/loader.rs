use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    let sender = config.sender_filter.trim();
    if sender.is_empty() || !sender.contains('@') {
        return Err(ConfigError::Validation {
            message: format!(
                "sender_filter must be an email address, got '{}'",
                config.sender_filter
            ),
        });
    }

    if config.mailboxes.is_empty() {
        return Err(ConfigError::Validation {
            message: "At least one mailbox must be configured".to_string(),
        });
    }

    let mut seen = std::collections::HashSet::new();
    for mailbox in &config.mailboxes {
        if !seen.insert(mailbox) {
            return Err(ConfigError::Validation {
                message: format!("Duplicate mailbox '{}'", mailbox),
            });
        }
    }

    if config.schedule.interval_minutes == 0 {
        return Err(ConfigError::Validation {
            message: "schedule.interval_minutes must be greater than 0".to_string(),
        });
    }

    if !crate::secrets::has_secret_source(
        config.imap.auth.password_insecure.as_deref(),
        config.imap.auth.password_file.as_deref(),
        config.imap.auth.password_env_var.as_deref(),
    ) {
        return Err(ConfigError::Validation {
            message: "imap.auth needs one of passwordInsecure, passwordFile or passwordEnvVar"
                .to_string(),
        });
    }

    Ok(())
}
