//! In-memory ledger backend.
//!
//! Keeps entries in a Vec behind a read-write lock, with a companion set of
//! settled order ids so the duplicate-credit check stays O(1). No
//! persistence across restarts; the default for tests and development.

use crate::{LedgerEntry, LedgerError, LedgerInterface};
use async_trait::async_trait;
use mercato_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
	entries: Vec<LedgerEntry>,
	settled_orders: HashSet<String>,
}

/// In-memory ledger implementation.
///
/// Clones share the same underlying state, so a test can keep a handle
/// while the engine owns the boxed backend.
#[derive(Clone, Default)]
pub struct MemoryLedger {
	inner: Arc<RwLock<Inner>>,
}

impl MemoryLedger {
	/// Creates a new MemoryLedger with no entries.
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl LedgerInterface for MemoryLedger {
	async fn credit(&self, entry: LedgerEntry) -> Result<(), LedgerError> {
		// Check and append under one write lock.
		let mut inner = self.inner.write().await;
		if inner.settled_orders.contains(&entry.order_id) {
			return Err(LedgerError::AlreadySettled(entry.order_id));
		}
		inner.settled_orders.insert(entry.order_id.clone());
		inner.entries.push(entry);
		Ok(())
	}

	async fn balance(&self, vendor_id: &str) -> Result<Decimal, LedgerError> {
		let inner = self.inner.read().await;
		Ok(inner
			.entries
			.iter()
			.filter(|e| e.vendor_id == vendor_id)
			.map(|e| e.amount)
			.sum())
	}

	async fn entries(&self, vendor_id: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
		let inner = self.inner.read().await;
		Ok(inner
			.entries
			.iter()
			.filter(|e| e.vendor_id == vendor_id)
			.cloned()
			.collect())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryLedgerSchema)
	}
}

/// Configuration schema for MemoryLedger. No parameters are accepted.
pub struct MemoryLedgerSchema;

impl ConfigSchema for MemoryLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Registry entry for the memory backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::LedgerFactory;

	fn factory() -> Self::Factory {
		create_ledger
	}
}

impl crate::LedgerRegistry for Registry {}

/// Factory function to create an in-memory ledger backend.
pub fn create_ledger(_config: &toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError> {
	Ok(Box::new(MemoryLedger::new()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal_macros::dec;

	#[tokio::test]
	async fn duplicate_order_rejected_across_vendors() {
		let ledger = MemoryLedger::new();
		ledger
			.credit(LedgerEntry::new("v-1", "o-1", dec!(95.00)))
			.await
			.unwrap();

		// The guard is per order, not per (vendor, order) pair.
		let err = ledger
			.credit(LedgerEntry::new("v-2", "o-1", dec!(95.00)))
			.await
			.unwrap_err();
		assert!(matches!(err, LedgerError::AlreadySettled(_)));
		assert_eq!(ledger.balance("v-2").await.unwrap(), dec!(0));
	}

	#[tokio::test]
	async fn entries_preserve_credit_order() {
		let ledger = MemoryLedger::new();
		ledger
			.credit(LedgerEntry::new("v-1", "o-1", dec!(10.00)))
			.await
			.unwrap();
		ledger
			.credit(LedgerEntry::new("v-1", "o-2", dec!(20.00)))
			.await
			.unwrap();

		let entries = ledger.entries("v-1").await.unwrap();
		assert_eq!(entries.len(), 2);
		assert_eq!(entries[0].order_id, "o-1");
		assert_eq!(entries[1].order_id, "o-2");
	}
}
