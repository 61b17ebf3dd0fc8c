//! Auxiliary data that certain transition edges require.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::InspectionResult;

/// Optional metadata attached to a transition request.
///
/// Which fields an edge requires is declared in the transition table;
/// supplying extra fields is harmless, omitting a required one is a
/// MissingPayload rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitionPayload {
	/// Delivery staff inspection outcome; required when moving an order out
	/// of OutForDelivery.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub inspection_result: Option<InspectionResult>,
	/// Required when rejecting an installment agreement.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rejection_reason: Option<String>,
	/// Carrier shipment id, attachable on shipment updates.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub carrier_shipment_id: Option<String>,
	/// Tracking URL, attachable on shipment updates.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tracking_url: Option<String>,
	/// Free-text carrier notes, attachable on shipment updates.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub carrier_notes: Option<String>,
}

impl TransitionPayload {
	/// Payload carrying only an inspection result.
	pub fn inspection(result: InspectionResult) -> Self {
		Self {
			inspection_result: Some(result),
			..Self::default()
		}
	}

	/// Payload carrying only a rejection reason.
	pub fn rejection(reason: impl Into<String>) -> Self {
		Self {
			rejection_reason: Some(reason.into()),
			..Self::default()
		}
	}
}

/// Payload field an edge may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadField {
	InspectionResult,
	RejectionReason,
}

impl PayloadField {
	/// Whether the payload satisfies this requirement. A whitespace-only
	/// rejection reason counts as absent.
	pub fn is_satisfied_by(&self, payload: &TransitionPayload) -> bool {
		match self {
			PayloadField::InspectionResult => payload.inspection_result.is_some(),
			PayloadField::RejectionReason => payload
				.rejection_reason
				.as_deref()
				.is_some_and(|r| !r.trim().is_empty()),
		}
	}
}

impl fmt::Display for PayloadField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PayloadField::InspectionResult => write!(f, "inspection_result"),
			PayloadField::RejectionReason => write!(f, "rejection_reason"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blank_rejection_reason_is_absent() {
		let blank = TransitionPayload::rejection("   ");
		assert!(!PayloadField::RejectionReason.is_satisfied_by(&blank));
		let real = TransitionPayload::rejection("documents illegible");
		assert!(PayloadField::RejectionReason.is_satisfied_by(&real));
	}

	#[test]
	fn inspection_requirement() {
		assert!(!PayloadField::InspectionResult.is_satisfied_by(&TransitionPayload::default()));
		assert!(PayloadField::InspectionResult
			.is_satisfied_by(&TransitionPayload::inspection(InspectionResult::Accepted)));
	}
}
