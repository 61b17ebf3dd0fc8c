//! In-memory storage backend.
//!
//! Stores data in a HashMap behind a read-write lock. Fast, no persistence
//! across restarts; the default for tests and development.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use mercato_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage implementation.
pub struct MemoryStorage {
	store: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
	/// Creates a new MemoryStorage instance.
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		store.get(key).cloned().ok_or(StorageError::NotFound)
	}

	async fn set_bytes_checked(
		&self,
		key: &str,
		value: Vec<u8>,
		expected: Option<&[u8]>,
	) -> Result<(), StorageError> {
		// Compare and swap under one write lock.
		let mut store = self.store.write().await;
		let current = store.get(key).map(|v| v.as_slice());
		if current != expected {
			return Err(StorageError::Conflict);
		}
		store.insert(key.to_string(), value);
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory storage has no required configuration.
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Registry entry for the memory backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}

/// Factory function to create a memory storage backend from configuration.
pub fn create_storage(_config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	Ok(Box::new(MemoryStorage::new()))
}
