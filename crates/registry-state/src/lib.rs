//! State module for the allowance registry.
//!
//! The registry's durable state is exactly two keyed maps: allowance records
//! keyed by (owner, token, spender), and nonce counters keyed by owner. This
//! module provides the backend abstraction over those maps, supporting
//! in-memory and file-backed implementations, plus a typed service facade.
//!
//! Writes are applied through [`StateBatch`], an ordered set of writes a
//! backend commits atomically: either every write in the batch becomes
//! visible or none do. Callers gather all writes of one logical operation
//! into a single batch so a failed operation leaves no partial state.

use alloy_primitives::Address;
use async_trait::async_trait;
use registry_types::{AllowanceKey, AllowanceRecord, ConfigSchema, ImplementationRegistry};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during state operations.
#[derive(Debug, Error)]
pub enum StateError {
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the state backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// One write within an atomic commit.
#[derive(Debug, Clone)]
pub enum StateWrite {
	/// Overwrite the allowance record for a key.
	SetAllowance(AllowanceKey, AllowanceRecord),
	/// Remove the allowance record for a key. Reads of a cleared key fall
	/// back to the zero record, so clearing an absent key is a no-op.
	ClearAllowance(AllowanceKey),
	/// Set an owner's nonce counter.
	SetNonce(Address, u64),
}

/// Ordered set of writes applied atomically by a backend.
///
/// Writes apply in insertion order; a later write to the same key wins.
#[derive(Debug, Clone, Default)]
pub struct StateBatch {
	writes: Vec<StateWrite>,
}

impl StateBatch {
	/// Creates an empty batch.
	pub fn new() -> Self {
		Self::default()
	}

	/// Queue an allowance overwrite.
	pub fn set_allowance(&mut self, key: AllowanceKey, record: AllowanceRecord) {
		self.writes.push(StateWrite::SetAllowance(key, record));
	}

	/// Queue an allowance removal.
	pub fn clear_allowance(&mut self, key: AllowanceKey) {
		self.writes.push(StateWrite::ClearAllowance(key));
	}

	/// Queue a nonce-counter update.
	pub fn set_nonce(&mut self, owner: Address, value: u64) {
		self.writes.push(StateWrite::SetNonce(owner, value));
	}

	/// Whether the batch carries no writes.
	pub fn is_empty(&self) -> bool {
		self.writes.is_empty()
	}

	/// The queued writes in application order.
	pub fn writes(&self) -> &[StateWrite] {
		&self.writes
	}
}

/// Trait defining the low-level interface for state backends.
///
/// Reads return `None` for absent keys; the typed defaults (zero record,
/// zero nonce) are applied by [`StateService`].
#[async_trait]
pub trait StateInterface: Send + Sync {
	/// Retrieves the allowance record for the given key, if present.
	async fn allowance(&self, key: &AllowanceKey) -> Result<Option<AllowanceRecord>, StateError>;

	/// Retrieves the nonce counter for the given owner, if present.
	async fn nonce(&self, owner: &Address) -> Result<Option<u64>, StateError>;

	/// Applies all writes in the batch atomically.
	async fn commit(&self, batch: StateBatch) -> Result<(), StateError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for state factory functions.
///
/// This is the function signature that all state implementations must
/// provide to create instances of their state interface.
pub type StateFactory = fn(&toml::Value) -> Result<Box<dyn StateInterface>, StateError>;

/// Registry trait for state implementations.
pub trait StateRegistry: ImplementationRegistry<Factory = StateFactory> {}

/// Get all registered state implementations.
///
/// Returns a vector of (name, factory) tuples for all available state
/// implementations, used by the builder to resolve the configured backend.
pub fn get_all_implementations() -> Vec<(&'static str, StateFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level state service that provides defaulted reads.
///
/// Wraps a state backend and maps absent keys to their protocol defaults:
/// the zero allowance record and the zero nonce.
pub struct StateService {
	/// The underlying state backend implementation.
	backend: Box<dyn StateInterface>,
}

impl StateService {
	/// Creates a new StateService with the specified backend.
	pub fn new(backend: Box<dyn StateInterface>) -> Self {
		Self { backend }
	}

	/// The allowance record for the given key, or the zero record.
	///
	/// A record with zero amount is indistinguishable from "no allowance".
	pub async fn allowance(&self, key: &AllowanceKey) -> Result<AllowanceRecord, StateError> {
		Ok(self.backend.allowance(key).await?.unwrap_or_default())
	}

	/// The nonce counter for the given owner, starting at zero.
	pub async fn nonce(&self, owner: &Address) -> Result<u64, StateError> {
		Ok(self.backend.nonce(owner).await?.unwrap_or(0))
	}

	/// Applies all writes in the batch atomically. Empty batches are not
	/// forwarded to the backend.
	pub async fn commit(&self, batch: StateBatch) -> Result<(), StateError> {
		if batch.is_empty() {
			return Ok(());
		}
		self.backend.commit(batch).await
	}
}
