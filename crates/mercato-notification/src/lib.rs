//! Notification module for the mercato status engine.
//!
//! This module handles delivery of status-change notifications to customers,
//! vendors and platform admins. It provides an abstraction
//! over notification channels so the engine can announce transitions without
//! knowing how messages reach their recipients.

use async_trait::async_trait;
use mercato_types::{ConfigSchema, Notification};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod log;
	pub mod memory;
}

/// Errors that can occur during notification delivery.
#[derive(Debug, Error)]
pub enum NotificationError {
	/// Error that occurs when delivering a notification fails.
	#[error("Delivery error: {0}")]
	Delivery(String),
	/// Error that occurs when the provider configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for notification providers.
///
/// This trait must be implemented by any notification channel that wants to
/// integrate with the status engine. Delivery failures are reported to the
/// caller but never affect an already-persisted transition.
#[async_trait]
pub trait NotificationInterface: Send + Sync {
	/// Returns the configuration schema for this notification implementation.
	///
	/// This allows each implementation to define its own configuration
	/// requirements with specific validation rules.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Delivers a single notification to its recipient.
	async fn notify(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Type alias for notification provider factory functions.
pub type NotificationFactory =
	fn(&toml::Value) -> Result<Box<dyn NotificationInterface>, NotificationError>;

/// Registry trait for notification implementations.
pub trait NotificationRegistry: mercato_types::ImplementationRegistry<Factory = NotificationFactory> {}

/// Get all registered notification implementations.
pub fn get_all_implementations() -> Vec<(&'static str, NotificationFactory)> {
	use mercato_types::ImplementationRegistry;
	vec![
		(
			implementations::log::Registry::NAME,
			implementations::log::Registry::factory(),
		),
		(
			implementations::memory::Registry::NAME,
			implementations::memory::Registry::factory(),
		),
	]
}

/// Service that delivers notifications through the configured provider.
pub struct NotificationService {
	provider: Box<dyn NotificationInterface>,
}

impl NotificationService {
	/// Creates a new NotificationService with the specified provider.
	pub fn new(provider: Box<dyn NotificationInterface>) -> Self {
		Self { provider }
	}

	/// Delivers a single notification.
	pub async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
		self.provider.notify(notification).await
	}
}
