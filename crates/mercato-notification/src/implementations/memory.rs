//! In-memory notification backend.
//!
//! Records every notification instead of delivering it, so tests can assert
//! on exactly what the engine announced and in what order.

use crate::{NotificationError, NotificationInterface};
use async_trait::async_trait;
use mercato_types::{ConfigSchema, ImplementationRegistry, Notification, Schema, ValidationError};
use std::sync::{Arc, Mutex};

/// Notification implementation that captures messages in memory.
///
/// Clones share the same buffer, so a test can keep a handle while the
/// engine owns the boxed provider.
#[derive(Clone, Default)]
pub struct MemoryNotifier {
	sent: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
	/// Creates a new MemoryNotifier with an empty buffer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a copy of every notification recorded so far, in send order.
	pub fn sent(&self) -> Vec<Notification> {
		self.sent.lock().map(|s| s.clone()).unwrap_or_default()
	}
}

#[async_trait]
impl NotificationInterface for MemoryNotifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryNotifierSchema)
	}

	async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
		self.sent
			.lock()
			.map_err(|_| NotificationError::Delivery("notification buffer poisoned".to_string()))?
			.push(notification.clone());
		Ok(())
	}
}

/// Configuration schema for MemoryNotifier. No parameters are accepted.
pub struct MemoryNotifierSchema;

impl ConfigSchema for MemoryNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Registry entry for the memory backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::NotificationFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl crate::NotificationRegistry for Registry {}

/// Factory function to create an in-memory notification backend.
pub fn create_notifier(
	_config: &toml::Value,
) -> Result<Box<dyn NotificationInterface>, NotificationError> {
	Ok(Box::new(MemoryNotifier::new()))
}
