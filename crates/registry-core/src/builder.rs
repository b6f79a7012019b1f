//! Construction of an [`AllowanceRegistry`] from configuration.
//!
//! Resolves the state and verifier implementations named in the `primary`
//! fields against the factories each backend crate registers, validates the
//! matching TOML sections against the implementations' own schemas, and
//! wires in the caller-supplied token capability.

use crate::{AllowanceRegistry, TokenTransfer};
use registry_config::Config;
use registry_state::{StateInterface, StateService};
use registry_verifier::{VerifierInterface, VerifierService};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while building a registry from configuration.
#[derive(Debug, Error)]
pub enum BuilderError {
	/// A configured implementation is unknown or its section is invalid.
	#[error("Configuration error: {0}")]
	Config(String),
	/// The state backend failed to initialize.
	#[error("State backend error: {0}")]
	State(String),
	/// The verifier failed to initialize.
	#[error("Verifier error: {0}")]
	Verifier(String),
}

/// Builder wiring configuration and the external token capability into a
/// ready [`AllowanceRegistry`].
pub struct RegistryBuilder {
	config: Config,
	token: Arc<dyn TokenTransfer>,
}

impl RegistryBuilder {
	/// Creates a builder over a validated configuration. The token
	/// capability is external and cannot come from configuration.
	pub fn new(config: Config, token: Arc<dyn TokenTransfer>) -> Self {
		Self { config, token }
	}

	/// Builds the registry, resolving and validating both backends.
	pub fn build(self) -> Result<AllowanceRegistry, BuilderError> {
		let state = build_state(&self.config)?;
		let verifier = build_verifier(&self.config)?;

		tracing::info!(
			state = %self.config.state.primary,
			verifier = %self.config.verifier.primary,
			chain_id = self.config.domain.chain_id,
			"registry built"
		);
		Ok(AllowanceRegistry::new(
			self.config.domain,
			Arc::new(StateService::new(state)),
			Arc::new(VerifierService::new(verifier)),
			self.token,
		))
	}
}

fn build_state(config: &Config) -> Result<Box<dyn StateInterface>, BuilderError> {
	let name = &config.state.primary;
	let section = config
		.state
		.implementations
		.get(name)
		.ok_or_else(|| BuilderError::Config(format!("state implementation '{}' is not configured", name)))?;
	let factory = registry_state::get_all_implementations()
		.into_iter()
		.find(|(registered, _)| *registered == name.as_str())
		.map(|(_, factory)| factory)
		.ok_or_else(|| BuilderError::Config(format!("unknown state implementation '{}'", name)))?;

	let backend = factory(section).map_err(|e| BuilderError::State(e.to_string()))?;
	backend
		.config_schema()
		.validate(section)
		.map_err(|e| BuilderError::Config(e.to_string()))?;
	Ok(backend)
}

fn build_verifier(config: &Config) -> Result<Box<dyn VerifierInterface>, BuilderError> {
	let name = &config.verifier.primary;
	let section = config
		.verifier
		.implementations
		.get(name)
		.ok_or_else(|| {
			BuilderError::Config(format!("verifier implementation '{}' is not configured", name))
		})?;
	let factory = registry_verifier::get_all_implementations()
		.into_iter()
		.find(|(registered, _)| *registered == name.as_str())
		.map(|(_, factory)| factory)
		.ok_or_else(|| BuilderError::Config(format!("unknown verifier implementation '{}'", name)))?;

	let implementation = factory(section).map_err(|e| BuilderError::Verifier(e.to_string()))?;
	implementation
		.config_schema()
		.validate(section)
		.map_err(|e| BuilderError::Config(e.to_string()))?;
	Ok(implementation)
}
