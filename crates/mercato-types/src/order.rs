//! Order and line item records.
//!
//! An order is the unit of mutation for the status engine. It carries a
//! monotonic version counter bumped on every persisted write; the storage
//! layer uses the serialized prior snapshot for compare-and-swap, so two
//! writers racing on the same order cannot both win.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::OrderStatus;

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
	CashOnDelivery,
	BankTransfer,
	EWallet,
	/// Three-month installment plan.
	Installment3,
	/// Six-month installment plan.
	Installment6,
	/// Twelve-month installment plan.
	Installment12,
}

impl PaymentMethod {
	/// Number of monthly installments, or None for immediate methods.
	pub fn installment_months(&self) -> Option<u32> {
		match self {
			PaymentMethod::Installment3 => Some(3),
			PaymentMethod::Installment6 => Some(6),
			PaymentMethod::Installment12 => Some(12),
			_ => None,
		}
	}

	pub fn is_installment(&self) -> bool {
		self.installment_months().is_some()
	}
}

/// Settlement state of the payment itself, tracked informationally.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
	Unpaid,
	Paid,
	Refunded,
}

/// One line item of an order. Immutable after order creation; quantity and
/// unit price are snapshots taken at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
	pub product_id: String,
	/// Product name snapshot at checkout.
	pub name: String,
	pub quantity: u32,
	/// Unit price snapshot at checkout.
	pub unit_price: Decimal,
}

impl OrderItem {
	pub fn line_total(&self) -> Decimal {
		self.unit_price * Decimal::from(self.quantity)
	}
}

/// Represents one purchase.
///
/// Orders are created Pending by checkout, mutated only through the status
/// engine, and never physically deleted (soft-delete flag only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	pub customer_id: String,
	/// Vendor fulfilling the order, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vendor_id: Option<String>,
	/// Delivery staff assigned once the order goes out.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delivery_staff_id: Option<String>,
	/// Current fulfillment status.
	pub status: OrderStatus,
	pub payment_method: PaymentMethod,
	pub payment_state: PaymentState,
	pub items: Vec<OrderItem>,
	/// Sum of line totals at checkout.
	pub subtotal: Decimal,
	pub delivery_fee: Decimal,
	pub delivery_address: String,
	pub delivery_phone: String,
	/// Set once the vendor commission for this order has been credited.
	/// Guards the ledger write against duplicate delivery confirmations.
	pub commission_settled: bool,
	/// Soft-delete flag; rows are never removed.
	pub deleted: bool,
	/// Timestamp when this order was created.
	pub created_at: u64,
	/// Timestamp when this order was last updated.
	pub updated_at: u64,
	/// Monotonic counter bumped on every persisted write.
	pub version: u64,
}

impl Order {
	/// Final amount owed: always derived, never stored or mutated
	/// independently.
	pub fn final_amount(&self) -> Decimal {
		self.subtotal + self.delivery_fee
	}
}

/// Checkout input for creating an order. The engine assigns identifier,
/// timestamps and the Pending status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
	pub customer_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vendor_id: Option<String>,
	pub payment_method: PaymentMethod,
	pub items: Vec<OrderItem>,
	pub delivery_fee: Decimal,
	pub delivery_address: String,
	pub delivery_phone: String,
	/// Installment terms; required when payment_method is an installment
	/// plan.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub installment: Option<InstallmentTerms>,
}

/// Installment plan terms submitted at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentTerms {
	pub down_payment: Decimal,
	pub monthly_installment: Decimal,
	/// References to stored identity document images.
	pub identity_documents: Vec<String>,
	pub terms_accepted: bool,
}
