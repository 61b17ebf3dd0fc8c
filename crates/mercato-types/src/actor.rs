//! Actor roles and the delivery inspection result.
//!
//! Callers resolve the role of the acting user themselves (session handling
//! is out of scope) and pass it to the engine; the engine never inspects
//! session machinery.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of the actor requesting a transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
	/// The purchasing customer.
	Customer,
	/// The vendor fulfilling the order.
	Vendor,
	/// On-the-ground delivery staff.
	DeliveryStaff,
	/// Platform administrator.
	Admin,
	/// Internal automation (dispatch assignment and the like).
	System,
}

impl fmt::Display for ActorRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ActorRole::Customer => "customer",
			ActorRole::Vendor => "vendor",
			ActorRole::DeliveryStaff => "delivery_staff",
			ActorRole::Admin => "admin",
			ActorRole::System => "system",
		};
		write!(f, "{}", s)
	}
}

/// Outcome of the delivery staff's on-the-ground parcel inspection.
///
/// Required when an order is moved out of OutForDelivery by delivery staff:
/// Accepted commits Delivered, Rejected commits Returned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionResult {
	Accepted,
	Rejected,
}

impl fmt::Display for InspectionResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			InspectionResult::Accepted => write!(f, "ACCEPTED"),
			InspectionResult::Rejected => write!(f, "REJECTED"),
		}
	}
}
