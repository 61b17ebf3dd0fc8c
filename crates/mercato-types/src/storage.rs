//! Storage namespace keys.

use std::str::FromStr;

/// Storage namespaces for the persisted collections.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Orders keyed by order id.
	Orders,
	/// Shipment records keyed by order id (1:0..1).
	Shipments,
	/// Installment agreements keyed by order id (1:0..1).
	Agreements,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Orders => "orders",
			StorageKey::Shipments => "shipments",
			StorageKey::Agreements => "agreements",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::Orders, Self::Shipments, Self::Agreements].into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"orders" => Ok(Self::Orders),
			"shipments" => Ok(Self::Shipments),
			"agreements" => Ok(Self::Agreements),
			_ => Err(()),
		}
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}
