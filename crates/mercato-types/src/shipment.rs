//! Carrier shipment record, the "busta" extension of an order.

use serde::{Deserialize, Serialize};

use crate::ShipmentStatus;

/// Optional 1:1 extension of an order once dispatched to the third-party
/// carrier. Cannot exist until the order has reached a dispatch-eligible
/// state; the engine enforces this at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentRecord {
	/// Order this shipment belongs to; also the storage key.
	pub order_id: String,
	/// Identifier assigned by the carrier.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub carrier_shipment_id: Option<String>,
	pub status: ShipmentStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tracking_url: Option<String>,
	/// Free-text notes from the carrier or the admin console.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub carrier_notes: Option<String>,
	/// Timestamp when the shipment was handed to the carrier.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sent_at: Option<u64>,
	pub created_at: u64,
	pub updated_at: u64,
	/// Monotonic counter bumped on every persisted write.
	pub version: u64,
}
