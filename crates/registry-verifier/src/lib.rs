//! Signature verification module for the allowance registry.
//!
//! This module provides the verification oracle the permit protocol relies
//! on: given a canonical message digest and a signature, recover the signing
//! identity or report failure. The registry core never touches curve math;
//! it compares the recovered identity against the claimed owner, so tests
//! can substitute a mock oracle for state-machine coverage.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use registry_types::{ConfigSchema, ImplementationRegistry, Signature};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod ecdsa;
}

/// Errors that can occur during signature verification.
#[derive(Debug, Error)]
pub enum VerifierError {
	/// Error that occurs when signature bytes cannot be parsed.
	#[error("Malformed signature: {0}")]
	MalformedSignature(String),
	/// Error that occurs when no identity can be recovered from the digest
	/// and signature.
	#[error("Recovery failed: {0}")]
	RecoveryFailed(String),
	/// Error that occurs when interacting with the verifier implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Trait defining the interface for verifier implementations.
///
/// Implementations recover the signing identity from a digest/signature
/// pair. They make no judgement about who was *expected* to sign; that
/// comparison belongs to the caller.
#[async_trait]
pub trait VerifierInterface: Send + Sync {
	/// Returns the configuration schema for this verifier implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Recovers the identity that signed the given digest.
	async fn recover(&self, digest: B256, signature: &Signature)
		-> Result<Address, VerifierError>;
}

/// Type alias for verifier factory functions.
pub type VerifierFactory = fn(&toml::Value) -> Result<Box<dyn VerifierInterface>, VerifierError>;

/// Registry trait for verifier implementations.
pub trait VerifierRegistry: ImplementationRegistry<Factory = VerifierFactory> {}

/// Get all registered verifier implementations.
///
/// Returns a vector of (name, factory) tuples for all available verifier
/// implementations, used by the builder to resolve the configured backend.
pub fn get_all_implementations() -> Vec<(&'static str, VerifierFactory)> {
	use implementations::ecdsa;

	vec![(ecdsa::Registry::NAME, ecdsa::Registry::factory())]
}

/// Service that manages signature verification.
///
/// Wraps an underlying verifier implementation behind a stable call surface
/// for the registry core.
pub struct VerifierService {
	/// The underlying verifier implementation.
	implementation: Box<dyn VerifierInterface>,
}

impl VerifierService {
	/// Creates a new VerifierService with the specified implementation.
	pub fn new(implementation: Box<dyn VerifierInterface>) -> Self {
		Self { implementation }
	}

	/// Recovers the identity that signed the given digest.
	pub async fn recover(
		&self,
		digest: B256,
		signature: &Signature,
	) -> Result<Address, VerifierError> {
		self.implementation.recover(digest, signature).await
	}
}
