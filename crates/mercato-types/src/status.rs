//! Status enumerations for the three coupled lifecycle dimensions.
//!
//! Each dimension is a closed enumeration with its own state space. The
//! legal edges between states live in the transition table in mercato-core;
//! this module only defines the states themselves and which of them are
//! terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fulfillment status of an order.
///
/// The main line runs Pending -> Confirmed -> Preparing -> OutForDelivery ->
/// Delivered. Rejected and Cancelled are side branches reachable from any
/// non-terminal state; Returned is the delivery-staff inspection fan-out
/// from OutForDelivery.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
	/// Order has been placed but not yet confirmed.
	Pending,
	/// Order accepted by the platform.
	Confirmed,
	/// Vendor is assembling the order.
	Preparing,
	/// Order handed to delivery staff.
	OutForDelivery,
	/// Customer accepted the parcel. Terminal.
	Delivered,
	/// Customer rejected the parcel at the door. Terminal.
	Returned,
	/// Order refused by vendor or platform. Terminal.
	Rejected,
	/// Order cancelled before fulfillment completed. Terminal.
	Cancelled,
}

impl OrderStatus {
	/// Returns true when no further transitions are possible.
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			OrderStatus::Delivered
				| OrderStatus::Returned
				| OrderStatus::Rejected
				| OrderStatus::Cancelled
		)
	}

	/// States from which a shipment record may be created.
	pub fn is_dispatch_eligible(&self) -> bool {
		matches!(self, OrderStatus::Preparing | OrderStatus::OutForDelivery)
	}

	/// All variants, used when expanding wildcard table rows.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pending,
			Self::Confirmed,
			Self::Preparing,
			Self::OutForDelivery,
			Self::Delivered,
			Self::Returned,
			Self::Rejected,
			Self::Cancelled,
		]
		.into_iter()
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			OrderStatus::Pending => "PENDING",
			OrderStatus::Confirmed => "CONFIRMED",
			OrderStatus::Preparing => "PREPARING",
			OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
			OrderStatus::Delivered => "DELIVERED",
			OrderStatus::Returned => "RETURNED",
			OrderStatus::Rejected => "REJECTED",
			OrderStatus::Cancelled => "CANCELLED",
		};
		write!(f, "{}", s)
	}
}

/// Carrier-facing shipment status, independent of the order status space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
	/// Shipment record created, not yet handed to the carrier.
	Pending,
	/// Handed over to the busta carrier.
	SentToBusta,
	/// Carrier picked the parcel up.
	PickedUp,
	/// Parcel moving through the carrier network.
	InTransit,
	/// Carrier courier is on the last leg.
	OutForDelivery,
	/// Parcel delivered. Terminal.
	Delivered,
	/// Delivery attempted but nobody accepted. Terminal.
	Attempted,
	/// Parcel returned to sender. Terminal.
	Returned,
	/// Shipment cancelled. Terminal.
	Cancelled,
	/// Carrier reported an exception. Terminal.
	Exception,
}

impl ShipmentStatus {
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			ShipmentStatus::Delivered
				| ShipmentStatus::Attempted
				| ShipmentStatus::Returned
				| ShipmentStatus::Cancelled
				| ShipmentStatus::Exception
		)
	}

	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pending,
			Self::SentToBusta,
			Self::PickedUp,
			Self::InTransit,
			Self::OutForDelivery,
			Self::Delivered,
			Self::Attempted,
			Self::Returned,
			Self::Cancelled,
			Self::Exception,
		]
		.into_iter()
	}
}

impl fmt::Display for ShipmentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ShipmentStatus::Pending => "PENDING",
			ShipmentStatus::SentToBusta => "SENT_TO_BUSTA",
			ShipmentStatus::PickedUp => "PICKED_UP",
			ShipmentStatus::InTransit => "IN_TRANSIT",
			ShipmentStatus::OutForDelivery => "OUT_FOR_DELIVERY",
			ShipmentStatus::Delivered => "DELIVERED",
			ShipmentStatus::Attempted => "ATTEMPTED",
			ShipmentStatus::Returned => "RETURNED",
			ShipmentStatus::Cancelled => "CANCELLED",
			ShipmentStatus::Exception => "EXCEPTION",
		};
		write!(f, "{}", s)
	}
}

/// Approval status of an installment agreement.
///
/// Expired exists in the state space but no code path produces it; there is
/// no expiry job and the transition table defines no inbound edge to it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
	/// Agreement submitted at checkout.
	Pending,
	/// Applicant documents verified complete.
	DocumentsComplete,
	/// Admin review in progress.
	UnderReview,
	/// Agreement approved; fulfillment may proceed. Terminal.
	Approved,
	/// Agreement rejected with a reason. Terminal.
	Rejected,
	/// Agreement lapsed. Terminal, never produced.
	Expired,
}

impl InstallmentStatus {
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			InstallmentStatus::Approved
				| InstallmentStatus::Rejected
				| InstallmentStatus::Expired
		)
	}

	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pending,
			Self::DocumentsComplete,
			Self::UnderReview,
			Self::Approved,
			Self::Rejected,
			Self::Expired,
		]
		.into_iter()
	}
}

impl fmt::Display for InstallmentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			InstallmentStatus::Pending => "PENDING",
			InstallmentStatus::DocumentsComplete => "DOCUMENTS_COMPLETE",
			InstallmentStatus::UnderReview => "UNDER_REVIEW",
			InstallmentStatus::Approved => "APPROVED",
			InstallmentStatus::Rejected => "REJECTED",
			InstallmentStatus::Expired => "EXPIRED",
		};
		write!(f, "{}", s)
	}
}
