//! Vendor ledger module for the mercato status engine.
//!
//! This crate tracks commission-adjusted credits owed to vendors. The engine
//! credits a vendor exactly once per delivered order; the ledger enforces
//! that invariant independently of the engine's own settled flag by
//! rejecting a second credit for the same order with AlreadySettled. The
//! vendor console reads balances and entry lists through the same interface.

use async_trait::async_trait;
use mercato_types::{now_secs, ConfigSchema, ImplementationRegistry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
	/// A credit for this order was already recorded.
	#[error("Commission for order '{0}' already settled")]
	AlreadySettled(String),
	/// Failure in the ledger backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs when the ledger configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// One settled credit on a vendor's ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
	pub vendor_id: String,
	/// Order whose delivery produced this credit. At most one entry per
	/// order across the whole ledger.
	pub order_id: String,
	/// Amount credited to the vendor, net of platform commission.
	pub amount: Decimal,
	pub created_at: u64,
}

impl LedgerEntry {
	/// Builds an entry stamped with the current time.
	pub fn new(vendor_id: impl Into<String>, order_id: impl Into<String>, amount: Decimal) -> Self {
		Self {
			vendor_id: vendor_id.into(),
			order_id: order_id.into(),
			amount,
			created_at: now_secs(),
		}
	}
}

/// Trait defining the interface for ledger backends.
///
/// Implementations must make `credit` atomic with respect to concurrent
/// callers: checking for an existing entry for the order and appending the
/// new one must happen under one lock (or equivalent).
#[async_trait]
pub trait LedgerInterface: Send + Sync {
	/// Credits the vendor for a delivered order.
	///
	/// Returns `LedgerError::AlreadySettled` when an entry for `order_id`
	/// already exists, regardless of which vendor it credited.
	async fn credit(&self, entry: LedgerEntry) -> Result<(), LedgerError>;

	/// Current balance of a vendor: the sum of all entry amounts.
	async fn balance(&self, vendor_id: &str) -> Result<Decimal, LedgerError>;

	/// All entries for a vendor in credit order.
	async fn entries(&self, vendor_id: &str) -> Result<Vec<LedgerEntry>, LedgerError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for ledger factory functions.
pub type LedgerFactory = fn(&toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError>;

/// Registry trait for ledger implementations.
pub trait LedgerRegistry: ImplementationRegistry<Factory = LedgerFactory> {}

/// Get all registered ledger implementations.
pub fn get_all_implementations() -> Vec<(&'static str, LedgerFactory)> {
	use implementations::memory;
	vec![(memory::Registry::NAME, memory::Registry::factory())]
}

/// Service wrapping the configured ledger backend.
pub struct LedgerService {
	backend: Box<dyn LedgerInterface>,
}

impl LedgerService {
	/// Creates a new LedgerService with the specified backend.
	pub fn new(backend: Box<dyn LedgerInterface>) -> Self {
		Self { backend }
	}

	/// Credits the vendor for a delivered order. At most one credit per
	/// order ever succeeds.
	pub async fn credit(&self, entry: LedgerEntry) -> Result<(), LedgerError> {
		self.backend.credit(entry).await
	}

	/// Current balance of a vendor.
	pub async fn balance(&self, vendor_id: &str) -> Result<Decimal, LedgerError> {
		self.backend.balance(vendor_id).await
	}

	/// All entries for a vendor in credit order.
	pub async fn entries(&self, vendor_id: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
		self.backend.entries(vendor_id).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryLedger;
	use rust_decimal_macros::dec;

	#[tokio::test]
	async fn double_credit_for_same_order_is_rejected() {
		let service = LedgerService::new(Box::new(MemoryLedger::new()));

		service
			.credit(LedgerEntry::new("v-1", "o-1", dec!(95.00)))
			.await
			.unwrap();
		let err = service
			.credit(LedgerEntry::new("v-1", "o-1", dec!(95.00)))
			.await
			.unwrap_err();
		assert!(matches!(err, LedgerError::AlreadySettled(id) if id == "o-1"));

		assert_eq!(service.balance("v-1").await.unwrap(), dec!(95.00));
		assert_eq!(service.entries("v-1").await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn balance_sums_across_orders() {
		let service = LedgerService::new(Box::new(MemoryLedger::new()));

		service
			.credit(LedgerEntry::new("v-1", "o-1", dec!(95.00)))
			.await
			.unwrap();
		service
			.credit(LedgerEntry::new("v-1", "o-2", dec!(47.50)))
			.await
			.unwrap();
		service
			.credit(LedgerEntry::new("v-2", "o-3", dec!(10.00)))
			.await
			.unwrap();

		assert_eq!(service.balance("v-1").await.unwrap(), dec!(142.50));
		assert_eq!(service.balance("v-2").await.unwrap(), dec!(10.00));
		assert_eq!(service.balance("v-3").await.unwrap(), dec!(0));
		assert_eq!(service.entries("v-1").await.unwrap().len(), 2);
	}
}
