//! File-based storage backend.
//!
//! Stores each record as a JSON file under a base directory, providing
//! simple persistence without external dependencies. Writes go through a
//! temp-file-then-rename sequence so a crash never leaves a half-written
//! record, and an exclusive lock file guards the directory against a second
//! process mutating the same store.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use fs2::FileExt;
use mercato_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::fs::File;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
	/// Exclusive directory lock, held for the lifetime of the store.
	_lock_file: File,
	/// Serializes compare-and-swap sequences within this process.
	write_lock: Mutex<()>,
}

impl FileStorage {
	/// Creates a new FileStorage rooted at the given directory, creating it
	/// when missing and taking the directory lock.
	pub fn new(base_path: PathBuf) -> Result<Self, StorageError> {
		std::fs::create_dir_all(&base_path).map_err(|e| StorageError::Backend(e.to_string()))?;

		let lock_path = base_path.join(".lock");
		let lock_file =
			File::create(&lock_path).map_err(|e| StorageError::Backend(e.to_string()))?;
		lock_file.try_lock_exclusive().map_err(|_| {
			StorageError::Backend(format!(
				"storage directory {} is locked by another process",
				base_path.display()
			))
		})?;

		Ok(Self {
			base_path,
			_lock_file: lock_file,
			write_lock: Mutex::new(()),
		})
	}

	/// Converts a storage key to a filesystem-safe file path.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', ':'], "_");
		self.base_path.join(format!("{}.json", safe_key))
	}

	async fn read_current(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
		match fs::read(self.get_file_path(key)).await {
			Ok(data) => Ok(Some(data)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	/// Writes atomically: temp file in the same directory, then rename.
	async fn write_atomic(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
		let path = self.get_file_path(key);
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		self.read_current(key).await?.ok_or(StorageError::NotFound)
	}

	async fn set_bytes_checked(
		&self,
		key: &str,
		value: Vec<u8>,
		expected: Option<&[u8]>,
	) -> Result<(), StorageError> {
		// Read-compare-write must be one critical section.
		let _guard = self.write_lock.lock().await;
		let current = self.read_current(key).await?;
		if current.as_deref() != expected {
			return Err(StorageError::Conflict);
		}
		self.write_atomic(key, &value).await
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("storage_path", FieldType::String)],
			vec![],
		);
		schema.validate(config)
	}
}

/// Registry entry for the file backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: base directory for record files (required)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.ok_or_else(|| StorageError::Configuration("storage_path is required".to_string()))?;
	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))?))
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[tokio::test]
	async fn persists_across_instances() {
		let dir = tempdir().unwrap();
		{
			let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
			storage
				.set_bytes_checked("orders:o-1", b"snapshot".to_vec(), None)
				.await
				.unwrap();
		}
		let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
		assert_eq!(
			storage.get_bytes("orders:o-1").await.unwrap(),
			b"snapshot".to_vec()
		);
	}

	#[tokio::test]
	async fn checked_write_conflicts_on_stale_snapshot() {
		let dir = tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

		storage
			.set_bytes_checked("orders:o-1", b"v1".to_vec(), None)
			.await
			.unwrap();
		storage
			.set_bytes_checked("orders:o-1", b"v2".to_vec(), Some(b"v1"))
			.await
			.unwrap();
		assert!(matches!(
			storage
				.set_bytes_checked("orders:o-1", b"v3".to_vec(), Some(b"v1"))
				.await,
			Err(StorageError::Conflict)
		));
	}

	#[tokio::test]
	async fn locks_out_a_second_instance() {
		let dir = tempdir().unwrap();
		let _storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
		assert!(matches!(
			FileStorage::new(dir.path().to_path_buf()),
			Err(StorageError::Backend(_))
		));
	}

	#[test]
	fn factory_requires_storage_path() {
		let config: toml::Value = "".parse().unwrap();
		assert!(matches!(
			create_storage(&config),
			Err(StorageError::Configuration(_))
		));
	}
}
