//! Log-based notification backend.
//!
//! Emits each notification as a structured tracing event instead of sending
//! it anywhere. Useful for development and for deployments where an external
//! messaging gateway is not wired up yet.

use crate::{NotificationError, NotificationInterface};
use async_trait::async_trait;
use mercato_types::{ConfigSchema, ImplementationRegistry, Notification, Schema, ValidationError};

/// Notification implementation that writes to the tracing log.
pub struct LogNotifier;

#[async_trait]
impl NotificationInterface for LogNotifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LogNotifierSchema)
	}

	async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
		tracing::info!(
			recipient = %notification.recipient,
			template = %notification.template,
			context = %notification.context,
			"notification"
		);
		Ok(())
	}
}

/// Configuration schema for LogNotifier. No parameters are accepted.
pub struct LogNotifierSchema;

impl ConfigSchema for LogNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Registry entry for the log backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "log";
	type Factory = crate::NotificationFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl crate::NotificationRegistry for Registry {}

/// Factory function to create a log notification backend from configuration.
pub fn create_notifier(
	_config: &toml::Value,
) -> Result<Box<dyn NotificationInterface>, NotificationError> {
	Ok(Box::new(LogNotifier))
}
