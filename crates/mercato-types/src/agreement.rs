//! Installment agreement record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::InstallmentStatus;

/// Approval record required before an order paid via a multi-month plan can
/// proceed past Pending.
///
/// Amount reconciliation (`monthly_installment * number_of_installments +
/// down_payment` against `total_amount`) is deliberately not enforced here;
/// it is left to manual admin review. `reconciles()` is provided for
/// dashboards that want to surface a mismatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentAgreement {
	/// Order this agreement belongs to; also the storage key.
	pub order_id: String,
	/// Human-facing agreement number.
	pub agreement_number: String,
	pub status: InstallmentStatus,
	/// References to stored identity document images (storage itself is an
	/// external concern).
	pub identity_documents: Vec<String>,
	pub total_amount: Decimal,
	pub down_payment: Decimal,
	pub number_of_installments: u32,
	pub monthly_installment: Decimal,
	pub terms_accepted: bool,
	/// Set when an admin rejects the agreement.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rejection_reason: Option<String>,
	pub created_at: u64,
	pub updated_at: u64,
	/// Monotonic counter bumped on every persisted write.
	pub version: u64,
}

impl InstallmentAgreement {
	/// Whether the plan arithmetic adds up. Informational only.
	pub fn reconciles(&self) -> bool {
		self.monthly_installment * Decimal::from(self.number_of_installments) + self.down_payment
			== self.total_amount
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal_macros::dec;

	#[test]
	fn reconciliation_is_informational() {
		let agreement = InstallmentAgreement {
			order_id: "o-1".into(),
			agreement_number: "AGR-0001".into(),
			status: InstallmentStatus::Pending,
			identity_documents: vec!["doc-1".into()],
			total_amount: dec!(1200.00),
			down_payment: dec!(200.00),
			number_of_installments: 10,
			monthly_installment: dec!(100.00),
			terms_accepted: true,
			rejection_reason: None,
			created_at: 0,
			updated_at: 0,
			version: 0,
		};
		assert!(agreement.reconciles());

		let skewed = InstallmentAgreement {
			monthly_installment: dec!(90.00),
			..agreement
		};
		assert!(!skewed.reconciles());
	}
}
