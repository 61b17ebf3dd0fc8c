//! Storage module for the mercato status engine.
//!
//! This crate provides abstractions for persisting orders, shipment records
//! and installment agreements, with pluggable backends (in-memory and
//! file-based). The interface is deliberately small: a byte-level read plus
//! a compare-and-swap write, which the engine uses to serialize concurrent
//! read-validate-write sequences on the same record. Records are never
//! physically removed; orders are soft-deleted in place.

use async_trait::async_trait;
use mercato_types::{ConfigSchema, ImplementationRegistry};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// A requested item is not found.
	#[error("Not found")]
	NotFound,
	/// The stored value no longer matches the snapshot the caller read;
	/// someone else won the race.
	#[error("Conflict: value changed since it was read")]
	Conflict,
	/// Serialization/deserialization failure.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Failure in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Configuration validation failure.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// Implementations must make `set_bytes_checked` atomic with respect to
/// concurrent callers: comparing the stored value against `expected` and
/// replacing it must happen under one lock (or equivalent).
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes only when the current value matches `expected`.
	///
	/// `expected = None` means the key must not exist yet (insert-if-absent).
	/// Returns `StorageError::Conflict` when the comparison fails.
	async fn set_bytes_checked(
		&self,
		key: &str,
		value: Vec<u8>,
		expected: Option<&[u8]>,
	) -> Result<(), StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples used by the service factory
/// registry.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level storage service that provides typed operations.
///
/// Wraps a byte-level backend with JSON serialization. Records written by
/// this service are always produced by `serde_json` from the same struct
/// type, so serializing the snapshot a caller previously read reproduces the
/// stored bytes exactly; that makes snapshot-based compare-and-swap sound.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	/// Stores a new value, failing with Conflict when the key already exists.
	pub async fn insert<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes_checked(&Self::key(namespace, id), bytes, None)
			.await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Replaces a value only when the stored record still equals `expected`.
	///
	/// This is the engine's write path: it reads a snapshot, validates the
	/// requested transition against it, then commits with the snapshot as
	/// the expected value. A concurrent writer that committed in between
	/// makes this call fail with Conflict and nothing is written.
	pub async fn update_checked<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
		expected: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		let expected_bytes =
			serde_json::to_vec(expected).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes_checked(&Self::key(namespace, id), bytes, Some(&expected_bytes))
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Record {
		id: String,
		status: String,
		version: u64,
	}

	fn service() -> StorageService {
		StorageService::new(Box::new(MemoryStorage::new()))
	}

	#[tokio::test]
	async fn typed_round_trip() {
		let storage = service();
		let rec = Record {
			id: "o-1".into(),
			status: "PENDING".into(),
			version: 0,
		};
		storage.insert("orders", "o-1", &rec).await.unwrap();
		let back: Record = storage.retrieve("orders", "o-1").await.unwrap();
		assert_eq!(back, rec);
	}

	#[tokio::test]
	async fn insert_rejects_existing_key() {
		let storage = service();
		let rec = Record {
			id: "o-1".into(),
			status: "PENDING".into(),
			version: 0,
		};
		storage.insert("orders", "o-1", &rec).await.unwrap();
		let err = storage.insert("orders", "o-1", &rec).await.unwrap_err();
		assert!(matches!(err, StorageError::Conflict));
	}

	#[tokio::test]
	async fn checked_update_detects_lost_update() {
		let storage = service();
		let initial = Record {
			id: "o-1".into(),
			status: "PENDING".into(),
			version: 0,
		};
		storage.insert("orders", "o-1", &initial).await.unwrap();

		// Two writers read the same snapshot and race.
		let first = Record {
			status: "CONFIRMED".into(),
			version: 1,
			..initial.clone()
		};
		let second = Record {
			status: "CANCELLED".into(),
			version: 1,
			..initial.clone()
		};

		storage
			.update_checked("orders", "o-1", &first, &initial)
			.await
			.unwrap();
		let err = storage
			.update_checked("orders", "o-1", &second, &initial)
			.await
			.unwrap_err();
		assert!(matches!(err, StorageError::Conflict));

		// The winner's state is what persisted.
		let stored: Record = storage.retrieve("orders", "o-1").await.unwrap();
		assert_eq!(stored.status, "CONFIRMED");
	}
}
