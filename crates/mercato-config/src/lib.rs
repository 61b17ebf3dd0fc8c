//! Configuration module for the mercato status engine.
//!
//! This module provides structures and utilities for managing platform
//! configuration. It supports loading configuration from TOML files, resolving
//! environment variable references, and validating that all required values
//! are properly set before the service starts.

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the mercato service.
///
/// Contains all configuration sections required to run the status engine:
/// platform identity and commission terms, the storage backend, notification
/// delivery, the vendor ledger, and the optional HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration for this platform instance.
	pub platform: PlatformConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for notification delivery.
	pub notification: NotificationConfig,
	/// Configuration for the vendor ledger.
	pub ledger: LedgerConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration for this platform instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformConfig {
	/// Unique identifier for this platform instance.
	pub id: String,
	/// Fraction of the order subtotal retained by the platform as commission.
	/// Vendors are credited the remainder. Defaults to 0.05 (5%).
	#[serde(default = "default_commission_rate")]
	pub commission_rate: Decimal,
}

/// Returns the default platform commission rate of 5%.
fn default_commission_rate() -> Decimal {
	Decimal::new(5, 2)
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for notification delivery.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of notification implementation names to their configurations.
	/// Each implementation has its own configuration format stored as raw TOML values.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the vendor ledger.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of ledger implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
}

/// Returns the default API host of 127.0.0.1 (localhost).
fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

/// Returns the default API port of 3000.
fn default_api_port() -> u16 {
	3000
}

/// Returns the default API request timeout of 30 seconds.
fn default_api_timeout() -> u64 {
	30
}

/// Returns the default maximum request size of 1MB.
fn default_max_request_size() -> usize {
	1024 * 1024 // 1MB
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	// Limit input size to prevent ReDoS attacks
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (full_match, var_name) = match (cap.get(0), cap.get(1)) {
			(Some(full), Some(name)) => (full, name.as_str()),
			_ => continue,
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => {
				if let Some(default) = default_value {
					default.to_string()
				} else {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

/// Validates that a primary implementation name refers to a configured entry.
fn validate_primary(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

impl Config {
	/// Loads configuration from a file with environment variable resolution.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let contents = tokio::fs::read_to_string(path).await?;
		contents.parse()
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// This method performs validation across all configuration sections:
	/// - Ensures the platform ID is not empty
	/// - Checks the commission rate falls within [0, 1)
	/// - Verifies each section's primary implementation is configured
	fn validate(&self) -> Result<(), ConfigError> {
		// Validate platform config
		if self.platform.id.is_empty() {
			return Err(ConfigError::Validation(
				"Platform ID cannot be empty".into(),
			));
		}
		if self.platform.commission_rate < Decimal::ZERO
			|| self.platform.commission_rate >= Decimal::ONE
		{
			return Err(ConfigError::Validation(format!(
				"Commission rate must be within [0, 1), got {}",
				self.platform.commission_rate
			)));
		}

		validate_primary("storage", &self.storage.primary, &self.storage.implementations)?;
		validate_primary(
			"notification",
			&self.notification.primary,
			&self.notification.implementations,
		)?;
		validate_primary("ledger", &self.ledger.primary, &self.ledger.implementations)?;

		Ok(())
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// Environment variables are resolved and the configuration is automatically
/// validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal_macros::dec;

	const BASE_CONFIG: &str = r#"
[platform]
id = "mercato-test"

[storage]
primary = "memory"
[storage.implementations.memory]

[notification]
primary = "log"
[notification.implementations.log]

[ledger]
primary = "memory"
[ledger.implementations.memory]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("TEST_MERCATO_HOST", "localhost");
		std::env::set_var("TEST_MERCATO_PORT", "5432");

		let input = "host = \"${TEST_MERCATO_HOST}:${TEST_MERCATO_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		std::env::remove_var("TEST_MERCATO_HOST");
		std::env::remove_var("TEST_MERCATO_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("MISSING_VAR"));
	}

	#[test]
	fn test_base_config_parses_with_defaults() {
		let config: Config = BASE_CONFIG.parse().unwrap();
		assert_eq!(config.platform.id, "mercato-test");
		assert_eq!(config.platform.commission_rate, dec!(0.05));
		assert!(config.api.is_none());
	}

	#[test]
	fn test_config_with_env_vars() {
		std::env::set_var("TEST_PLATFORM_ID", "mercato-env");

		let config_str = r#"
[platform]
id = "${TEST_PLATFORM_ID}"
commission_rate = "0.10"

[storage]
primary = "memory"
[storage.implementations.memory]

[notification]
primary = "log"
[notification.implementations.log]

[ledger]
primary = "memory"
[ledger.implementations.memory]
"#;

		let config: Config = config_str.parse().unwrap();
		assert_eq!(config.platform.id, "mercato-env");
		assert_eq!(config.platform.commission_rate, dec!(0.10));

		std::env::remove_var("TEST_PLATFORM_ID");
	}

	#[test]
	fn test_commission_rate_out_of_bounds_rejected() {
		let config_str = BASE_CONFIG.replace(
			"id = \"mercato-test\"",
			"id = \"mercato-test\"\ncommission_rate = \"1.5\"",
		);
		let result = Config::from_str(&config_str);
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("Commission rate must be within [0, 1)"));
	}

	#[test]
	fn test_unknown_primary_rejected() {
		let config_str = BASE_CONFIG.replace("primary = \"log\"", "primary = \"webhook\"");
		let result = Config::from_str(&config_str);
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("Primary notification 'webhook' not found"));
	}

	#[test]
	fn test_api_defaults() {
		let config_str = format!("{}\n[api]\nenabled = true\n", BASE_CONFIG);
		let config: Config = config_str.parse().unwrap();
		let api = config.api.unwrap();
		assert!(api.enabled);
		assert_eq!(api.host, "127.0.0.1");
		assert_eq!(api.port, 3000);
	}
}
