//! Dynamic factory registry for engine implementations.
//!
//! This module provides a centralized registry for all factory functions,
//! allowing dynamic instantiation of implementations based on configuration.

use mercato_config::Config;
use mercato_core::{EngineBuilder, EngineFactories, StatusEngine};
use mercato_ledger::LedgerFactory;
use mercato_notification::NotificationFactory;
use mercato_storage::StorageFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Global registry for all implementation factories.
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub notification: HashMap<String, NotificationFactory>,
	pub ledger: HashMap<String, LedgerFactory>,
}

impl FactoryRegistry {
	/// Create a new empty registry.
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			notification: HashMap::new(),
			ledger: HashMap::new(),
		}
	}

	/// Register a storage implementation.
	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}

	/// Register a notification implementation.
	pub fn register_notification(&mut self, name: impl Into<String>, factory: NotificationFactory) {
		self.notification.insert(name.into(), factory);
	}

	/// Register a ledger implementation.
	pub fn register_ledger(&mut self, name: impl Into<String>, factory: LedgerFactory) {
		self.ledger.insert(name.into(), factory);
	}
}

impl Default for FactoryRegistry {
	fn default() -> Self {
		Self::new()
	}
}

// Global registry instance
static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Initialize the global registry with all available implementations.
pub fn initialize_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in mercato_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}

		for (name, factory) in mercato_notification::get_all_implementations() {
			tracing::debug!("Registering notification implementation: {}", name);
			registry.register_notification(name, factory);
		}

		for (name, factory) in mercato_ledger::get_all_implementations() {
			tracing::debug!("Registering ledger implementation: {}", name);
			registry.register_ledger(name, factory);
		}

		registry
	})
}

/// Get the global factory registry.
pub fn get_registry() -> &'static FactoryRegistry {
	initialize_registry()
}

/// Build the status engine using the registry and configuration.
pub fn build_engine_from_config(
	config: Config,
) -> Result<StatusEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let factories = EngineFactories {
		storage_factories: registry.storage.clone(),
		notification_factories: registry.notification.clone(),
		ledger_factories: registry.ledger.clone(),
	};

	Ok(EngineBuilder::new(config).build(factories)?)
}
