//! In-memory state backend for the allowance registry.
//!
//! This module provides a memory-based implementation of the StateInterface
//! trait, useful for testing and for hosting environments that supply their
//! own durability.

use crate::{StateBatch, StateError, StateInterface, StateWrite};
use alloy_primitives::Address;
use async_trait::async_trait;
use registry_types::{AllowanceKey, AllowanceRecord, ConfigSchema, Schema, ValidationError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Maps {
	allowances: HashMap<AllowanceKey, AllowanceRecord>,
	nonces: HashMap<Address, u64>,
}

/// In-memory state implementation.
///
/// Both maps live behind one read-write lock, so a committed batch becomes
/// visible as a whole and never interleaves with a read.
pub struct MemoryState {
	maps: Arc<RwLock<Maps>>,
}

impl MemoryState {
	/// Creates a new MemoryState instance.
	pub fn new() -> Self {
		Self {
			maps: Arc::new(RwLock::new(Maps::default())),
		}
	}
}

impl Default for MemoryState {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StateInterface for MemoryState {
	async fn allowance(&self, key: &AllowanceKey) -> Result<Option<AllowanceRecord>, StateError> {
		let maps = self.maps.read().await;
		Ok(maps.allowances.get(key).copied())
	}

	async fn nonce(&self, owner: &Address) -> Result<Option<u64>, StateError> {
		let maps = self.maps.read().await;
		Ok(maps.nonces.get(owner).copied())
	}

	async fn commit(&self, batch: StateBatch) -> Result<(), StateError> {
		let mut maps = self.maps.write().await;
		for write in batch.writes() {
			match write {
				StateWrite::SetAllowance(key, record) => {
					maps.allowances.insert(*key, *record);
				}
				StateWrite::ClearAllowance(key) => {
					maps.allowances.remove(key);
				}
				StateWrite::SetNonce(owner, value) => {
					maps.nonces.insert(*owner, *value);
				}
			}
		}
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStateSchema)
	}
}

/// Configuration schema for MemoryState.
pub struct MemoryStateSchema;

impl ConfigSchema for MemoryStateSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory state has no required configuration
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Factory function to create a memory state backend from configuration.
///
/// Configuration parameters:
/// - None required for memory state
pub fn create_state(_config: &toml::Value) -> Result<Box<dyn StateInterface>, StateError> {
	Ok(Box::new(MemoryState::new()))
}

/// Registry entry for the memory backend.
pub struct Registry;

impl registry_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::StateFactory;

	fn factory() -> Self::Factory {
		create_state
	}
}

impl crate::StateRegistry for Registry {}
