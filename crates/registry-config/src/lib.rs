//! Configuration module for the allowance registry.
//!
//! This module provides structures and utilities for managing registry
//! configuration. It supports loading configuration from TOML files with
//! environment-variable resolution and validates that all required values
//! are properly set before any backend is constructed.

use alloy_primitives::Address;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
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
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the allowance registry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// EIP-712 signing-domain identity.
	pub domain: DomainConfig,
	/// Configuration for the state backend.
	pub state: StateConfig,
	/// Configuration for the signature verifier.
	pub verifier: VerifierConfig,
}

/// EIP-712 signing-domain identity for permit digests.
///
/// Compatibility-relevant: off-chain signing tooling must bind the same
/// name, chain id, and verifying contract or its digests will not match.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DomainConfig {
	/// Signing-domain name.
	#[serde(default = "default_domain_name")]
	pub name: String,
	/// Chain ID the registry is deployed on.
	pub chain_id: u64,
	/// The registry's own contract address, bound into every digest.
	pub verifying_contract: Address,
}

/// Returns the default signing-domain name.
fn default_domain_name() -> String {
	registry_types::utils::DOMAIN_NAME.to_string()
}

/// Configuration for the state backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of state implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the signature verifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerifierConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of verifier implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

impl Config {
	/// Validates the configuration structure.
	///
	/// Checks that the domain identity is populated and that each `primary`
	/// names a configured implementation. Backend-specific validation runs
	/// later against each implementation's own schema.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.domain.name.is_empty() {
			return Err(ConfigError::Validation("domain.name must not be empty".into()));
		}
		if self.domain.chain_id == 0 {
			return Err(ConfigError::Validation("domain.chain_id must be non-zero".into()));
		}
		if !self.state.implementations.contains_key(&self.state.primary) {
			return Err(ConfigError::Validation(format!(
				"state.primary '{}' has no matching entry in state.implementations",
				self.state.primary
			)));
		}
		if !self
			.verifier
			.implementations
			.contains_key(&self.verifier.primary)
		{
			return Err(ConfigError::Validation(format!(
				"verifier.primary '{}' has no matching entry in verifier.implementations",
				self.verifier.primary
			)));
		}
		Ok(())
	}

	/// Loads configuration from a TOML file, resolving environment
	/// variables before parsing.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		content.parse()
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

/// Resolves `${VAR}` and `${VAR:-default}` references against the process
/// environment. A reference without a default fails if the variable is
/// unset.
pub fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
		.expect("static pattern compiles");

	let mut output = String::with_capacity(input.len());
	let mut last = 0;
	for captures in pattern.captures_iter(input) {
		let whole = captures.get(0).expect("capture 0 always present");
		let name = &captures[1];
		let default = captures.get(3).map(|m| m.as_str());

		let value = match std::env::var(name) {
			Ok(value) => value,
			Err(_) => match default {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' is not set and has no default",
						name
					)))
				}
			},
		};

		output.push_str(&input[last..whole.start()]);
		output.push_str(&value);
		last = whole.end();
	}
	output.push_str(&input[last..]);
	Ok(output)
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE_CONFIG: &str = r#"
[domain]
chain_id = 1
verifying_contract = "0x1111111111111111111111111111111111111111"

[state]
primary = "memory"
[state.implementations.memory]

[verifier]
primary = "ecdsa"
[verifier.implementations.ecdsa]
"#;

	#[test]
	fn test_parse_and_defaults() {
		let config: Config = BASE_CONFIG.parse().unwrap();
		assert_eq!(config.domain.name, "AllowanceRegistry");
		assert_eq!(config.domain.chain_id, 1);
		assert_eq!(config.state.primary, "memory");
		assert_eq!(config.verifier.primary, "ecdsa");
	}

	#[test]
	fn test_primary_must_be_configured() {
		let content = BASE_CONFIG.replace("primary = \"memory\"", "primary = \"file\"");
		let result: Result<Config, _> = content.parse();
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("state.primary 'file'"));
	}

	#[test]
	fn test_zero_chain_id_rejected() {
		let content = BASE_CONFIG.replace("chain_id = 1", "chain_id = 0");
		let result: Result<Config, _> = content.parse();
		assert!(result.is_err());
	}

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("TEST_REGISTRY_CHAIN", "5");

		let input = "chain_id = ${TEST_REGISTRY_CHAIN}";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "chain_id = 5");

		std::env::remove_var("TEST_REGISTRY_CHAIN");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${MISSING_REGISTRY_VAR:-fallback}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"fallback\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${MISSING_REGISTRY_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("MISSING_REGISTRY_VAR"));
	}

	#[test]
	fn test_from_file() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = dir.path().join("registry.toml");
		std::fs::write(&path, BASE_CONFIG).unwrap();

		let config = Config::from_file(&path).unwrap();
		assert_eq!(config.domain.chain_id, 1);
	}
}
