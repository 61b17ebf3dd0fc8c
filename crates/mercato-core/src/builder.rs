//! Builder pattern for constructing status engines.
//!
//! Composes a StatusEngine from pluggable infrastructure implementations
//! using factory functions. Every configured implementation is
//! instantiated and validated against its own configuration schema; the
//! section's primary implementation is the one wired into the engine.

use crate::{LedgerService, NotificationService, StatusEngine, StorageService};
use mercato_config::Config;
use mercato_ledger::{LedgerError, LedgerInterface};
use mercato_notification::{NotificationError, NotificationInterface};
use mercato_storage::{StorageError, StorageInterface};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Container for all factory functions needed to build a StatusEngine.
pub struct EngineFactories<SF, NF, LF> {
	pub storage_factories: HashMap<String, SF>,
	pub notification_factories: HashMap<String, NF>,
	pub ledger_factories: HashMap<String, LF>,
}

/// Builder for constructing a StatusEngine with pluggable implementations.
pub struct EngineBuilder {
	config: Config,
}

impl EngineBuilder {
	/// Creates a new EngineBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the StatusEngine using factories for each component type.
	pub fn build<SF, NF, LF>(
		self,
		factories: EngineFactories<SF, NF, LF>,
	) -> Result<StatusEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		NF: Fn(&toml::Value) -> Result<Box<dyn NotificationInterface>, NotificationError>,
		LF: Fn(&toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError>,
	{
		let storage_backend = build_component(
			"storage",
			&self.config.storage.primary,
			&self.config.storage.implementations,
			&factories.storage_factories,
			|b: &Box<dyn StorageInterface>| b.config_schema(),
		)?;

		let notification_backend = build_component(
			"notification",
			&self.config.notification.primary,
			&self.config.notification.implementations,
			&factories.notification_factories,
			|b: &Box<dyn NotificationInterface>| b.config_schema(),
		)?;

		let ledger_backend = build_component(
			"ledger",
			&self.config.ledger.primary,
			&self.config.ledger.implementations,
			&factories.ledger_factories,
			|b: &Box<dyn LedgerInterface>| b.config_schema(),
		)?;

		Ok(StatusEngine::new(
			self.config,
			Arc::new(StorageService::new(storage_backend)),
			Arc::new(NotificationService::new(notification_backend)),
			Arc::new(LedgerService::new(ledger_backend)),
		))
	}
}

/// Instantiates every configured implementation of one component type,
/// validates each against its own schema, and returns the primary.
fn build_component<T, E, F>(
	component: &str,
	primary: &str,
	configured: &HashMap<String, toml::Value>,
	factories: &HashMap<String, F>,
	schema_of: impl Fn(&T) -> Box<dyn mercato_types::ConfigSchema>,
) -> Result<T, BuilderError>
where
	E: std::fmt::Display,
	F: Fn(&toml::Value) -> Result<T, E>,
{
	let mut built = HashMap::new();
	for (name, value) in configured {
		let factory = factories.get(name).ok_or_else(|| {
			let available: Vec<_> = factories.keys().cloned().collect();
			BuilderError::Config(format!(
				"Unknown {} implementation '{}'. Available: [{}]",
				component,
				name,
				available.join(", ")
			))
		})?;

		let implementation = factory(value).map_err(|e| {
			BuilderError::Config(format!(
				"Failed to create {} implementation '{}': {}",
				component, name, e
			))
		})?;

		schema_of(&implementation).validate(value).map_err(|e| {
			BuilderError::Config(format!(
				"Invalid configuration for {} implementation '{}': {}",
				component, name, e
			))
		})?;

		let is_primary = name == primary;
		tracing::info!(component, implementation = %name, enabled = is_primary, "Loaded");
		built.insert(name.clone(), implementation);
	}

	built.remove(primary).ok_or_else(|| {
		BuilderError::Config(format!(
			"Primary {} '{}' failed to load or has invalid configuration",
			component, primary
		))
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use mercato_types::{ActorRole, OrderStatus};

	const CONFIG: &str = r#"
[platform]
id = "mercato-test"

[storage]
primary = "memory"
[storage.implementations.memory]

[notification]
primary = "log"
[notification.implementations.log]

[ledger]
primary = "memory"
[ledger.implementations.memory]
"#;

	fn factories() -> EngineFactories<
		mercato_storage::StorageFactory,
		mercato_notification::NotificationFactory,
		mercato_ledger::LedgerFactory,
	> {
		EngineFactories {
			storage_factories: mercato_storage::get_all_implementations()
				.into_iter()
				.map(|(n, f)| (n.to_string(), f))
				.collect(),
			notification_factories: mercato_notification::get_all_implementations()
				.into_iter()
				.map(|(n, f)| (n.to_string(), f))
				.collect(),
			ledger_factories: mercato_ledger::get_all_implementations()
				.into_iter()
				.map(|(n, f)| (n.to_string(), f))
				.collect(),
		}
	}

	#[tokio::test]
	async fn builds_engine_from_registered_factories() {
		let config: Config = CONFIG.parse().unwrap();
		let engine = EngineBuilder::new(config).build(factories()).unwrap();

		// The built engine is functional end to end.
		let err = engine
			.request_order_transition(
				"missing",
				OrderStatus::Confirmed,
				ActorRole::Admin,
				&Default::default(),
			)
			.await
			.unwrap_err();
		assert!(matches!(err, crate::EngineError::NotFound(_)));
	}

	#[test]
	fn unknown_implementation_is_a_config_error() {
		let config: Config = CONFIG
			.replace("primary = \"log\"", "primary = \"webhook\"")
			.replace("implementations.log", "implementations.webhook")
			.parse()
			.unwrap();
		let err = EngineBuilder::new(config).build(factories()).unwrap_err();
		assert!(err.to_string().contains("Unknown notification implementation"));
	}
}
