//! File-backed state backend for the allowance registry.
//!
//! Persists both maps as one JSON snapshot on disk. Snapshots are written
//! atomically (temp file then rename) so a crash mid-commit leaves the
//! previous snapshot intact, and loaded lazily on first access.

use crate::{StateBatch, StateError, StateInterface, StateWrite};
use alloy_primitives::Address;
use async_trait::async_trait;
use registry_types::{
	AllowanceKey, AllowanceRecord, ConfigSchema, Field, FieldType, Schema, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;

/// On-disk form of the two maps. Entries are stored as pairs because JSON
/// object keys must be strings.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
	allowances: Vec<(AllowanceKey, AllowanceRecord)>,
	nonces: Vec<(Address, u64)>,
}

#[derive(Debug, Default)]
struct Maps {
	allowances: HashMap<AllowanceKey, AllowanceRecord>,
	nonces: HashMap<Address, u64>,
}

impl Maps {
	fn from_snapshot(snapshot: Snapshot) -> Self {
		Self {
			allowances: snapshot.allowances.into_iter().collect(),
			nonces: snapshot.nonces.into_iter().collect(),
		}
	}

	fn to_snapshot(&self) -> Snapshot {
		Snapshot {
			allowances: self.allowances.iter().map(|(k, v)| (*k, *v)).collect(),
			nonces: self.nonces.iter().map(|(k, v)| (*k, *v)).collect(),
		}
	}
}

/// File-based state implementation.
pub struct FileState {
	/// Snapshot path on disk.
	path: PathBuf,
	/// Cached maps, loaded from the snapshot on first access.
	maps: RwLock<Option<Maps>>,
}

impl FileState {
	/// Creates a new FileState persisting to the given path.
	pub fn new(path: PathBuf) -> Self {
		Self {
			path,
			maps: RwLock::new(None),
		}
	}

	async fn load(&self) -> Result<Maps, StateError> {
		match fs::read(&self.path).await {
			Ok(bytes) => {
				let snapshot: Snapshot = serde_json::from_slice(&bytes)
					.map_err(|e| StateError::Serialization(e.to_string()))?;
				Ok(Maps::from_snapshot(snapshot))
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				tracing::debug!(path = %self.path.display(), "no snapshot on disk, starting empty");
				Ok(Maps::default())
			}
			Err(e) => Err(StateError::Backend(e.to_string())),
		}
	}

	/// Runs `f` against the loaded maps, populating the cache if needed.
	async fn with_maps<T>(
		&self,
		f: impl FnOnce(&Maps) -> T,
	) -> Result<T, StateError> {
		{
			let guard = self.maps.read().await;
			if let Some(maps) = guard.as_ref() {
				return Ok(f(maps));
			}
		}
		let mut guard = self.maps.write().await;
		let maps = match guard.take() {
			Some(maps) => maps,
			None => self.load().await?,
		};
		let result = f(&maps);
		*guard = Some(maps);
		Ok(result)
	}

	async fn persist(&self, maps: &Maps) -> Result<(), StateError> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StateError::Backend(e.to_string()))?;
		}

		let bytes = serde_json::to_vec(&maps.to_snapshot())
			.map_err(|e| StateError::Serialization(e.to_string()))?;

		// Write atomically by writing to temp file then renaming
		let temp_path = self.path.with_extension("tmp");
		fs::write(&temp_path, bytes)
			.await
			.map_err(|e| StateError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &self.path)
			.await
			.map_err(|e| StateError::Backend(e.to_string()))?;

		Ok(())
	}
}

#[async_trait]
impl StateInterface for FileState {
	async fn allowance(&self, key: &AllowanceKey) -> Result<Option<AllowanceRecord>, StateError> {
		self.with_maps(|maps| maps.allowances.get(key).copied())
			.await
	}

	async fn nonce(&self, owner: &Address) -> Result<Option<u64>, StateError> {
		self.with_maps(|maps| maps.nonces.get(owner).copied())
			.await
	}

	async fn commit(&self, batch: StateBatch) -> Result<(), StateError> {
		let mut guard = self.maps.write().await;
		let mut maps = match guard.take() {
			Some(maps) => maps,
			None => self.load().await?,
		};

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

		// The snapshot write makes the batch durable before it becomes
		// visible; if it fails the cache stays empty and the next access
		// reloads the previous snapshot from disk.
		self.persist(&maps).await?;
		*guard = Some(maps);
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStateSchema)
	}
}

/// Configuration schema for FileState.
pub struct FileStateSchema;

impl ConfigSchema for FileStateSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(vec![], vec![Field::new("state_path", FieldType::String)]);
		schema.validate(config)
	}
}

/// Factory function to create a file state backend from configuration.
///
/// Configuration parameters:
/// - `state_path`: Snapshot file path (default: "./data/state.json")
pub fn create_state(config: &toml::Value) -> Result<Box<dyn StateInterface>, StateError> {
	let state_path = config
		.get("state_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/state.json")
		.to_string();

	Ok(Box::new(FileState::new(PathBuf::from(state_path))))
}

/// Registry entry for the file backend.
pub struct Registry;

impl registry_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::StateFactory;

	fn factory() -> Self::Factory {
		create_state
	}
}

impl crate::StateRegistry for Registry {}
