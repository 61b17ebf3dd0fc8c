//! Registry trait for self-registering implementations.
//!
//! Each infrastructure module (storage, notification, ledger) provides a
//! Registry struct implementing this trait, declaring its configuration name
//! and a factory function. The service binary collects them into a factory
//! registry at startup.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this
	/// implementation, for example "memory" for
	/// storage.implementations.memory.
	const NAME: &'static str;

	/// The factory function type this implementation provides. Each module
	/// defines its own factory type, for example StorageFactory for storage
	/// implementations.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
