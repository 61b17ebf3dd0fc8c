//! Notification recipients and template kinds.
//!
//! The actual transport (push, WhatsApp, email) lives behind the
//! NotificationInterface in mercato-notification; these types only name who
//! gets told what.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Party a notification is addressed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Recipient {
	Customer(String),
	Vendor(String),
	/// Admin notifications are broadcast to the console, no id needed.
	Admin,
}

impl fmt::Display for Recipient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Recipient::Customer(id) => write!(f, "customer:{}", id),
			Recipient::Vendor(id) => write!(f, "vendor:{}", id),
			Recipient::Admin => write!(f, "admin"),
		}
	}
}

/// Message template selected by the dispatcher. Wording and rendering are
/// the transport's concern.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
	/// Vendor: a new order was placed.
	NewOrder,
	/// Customer: order status changed (context carries the new status).
	OrderStatusChanged,
	/// Customer: parcel was returned after door inspection.
	OrderReturned,
	/// Customer: order was delivered.
	OrderDelivered,
	/// Admin: a new installment agreement was submitted.
	InstallmentSubmitted,
	/// Customer: installment agreement approved.
	InstallmentApproved,
	/// Customer: installment agreement rejected (context carries reason).
	InstallmentRejected,
	/// Customer: carrier shipment status changed.
	ShipmentStatusChanged,
}

impl fmt::Display for TemplateKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			TemplateKind::NewOrder => "new_order",
			TemplateKind::OrderStatusChanged => "order_status_changed",
			TemplateKind::OrderReturned => "order_returned",
			TemplateKind::OrderDelivered => "order_delivered",
			TemplateKind::InstallmentSubmitted => "installment_submitted",
			TemplateKind::InstallmentApproved => "installment_approved",
			TemplateKind::InstallmentRejected => "installment_rejected",
			TemplateKind::ShipmentStatusChanged => "shipment_status_changed",
		};
		write!(f, "{}", s)
	}
}

/// A notification handed to the sink: recipient, template and the context
/// values the template needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
	pub recipient: Recipient,
	pub template: TemplateKind,
	pub context: serde_json::Value,
}
