//! The side-effect dispatcher.
//!
//! Runs after a transition has durably committed, never before. It emits
//! one notification to the relevant party and, when an order reaches
//! Delivered, credits the vendor ledger with the commission-adjusted
//! subtotal. Failures here are logged and never unwind the committed
//! state change: a failed vendor credit is logged with the values needed
//! to replay it out of band.

use crate::{LedgerEntry, LedgerError, LedgerService, NotificationService};
use mercato_types::{
	truncate_id, InstallmentAgreement, InstallmentStatus, Notification, Order, OrderStatus,
	Recipient, ShipmentRecord, TemplateKind,
};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;

/// Dispatches notifications and ledger credits for committed transitions.
pub struct SideEffectDispatcher {
	notifications: Arc<NotificationService>,
	ledger: Arc<LedgerService>,
	/// Fraction of the subtotal retained by the platform. Sourced from the
	/// single [platform] commission_rate configuration entry.
	commission_rate: Decimal,
}

impl SideEffectDispatcher {
	pub fn new(
		notifications: Arc<NotificationService>,
		ledger: Arc<LedgerService>,
		commission_rate: Decimal,
	) -> Self {
		Self {
			notifications,
			ledger,
			commission_rate,
		}
	}

	/// Delivers a notification, logging failure instead of propagating it.
	async fn send(&self, notification: Notification) {
		if let Err(e) = self.notifications.notify(&notification).await {
			tracing::warn!(
				recipient = %notification.recipient,
				template = %notification.template,
				error = %e,
				"Notification delivery failed; committed state stands"
			);
		}
	}

	/// Announces a freshly created order to its vendor.
	pub async fn order_created(&self, order: &Order) {
		if let Some(vendor_id) = &order.vendor_id {
			self.send(Notification {
				recipient: Recipient::Vendor(vendor_id.clone()),
				template: TemplateKind::NewOrder,
				context: json!({
					"order_id": order.id,
					"subtotal": order.subtotal,
					"final_amount": order.final_amount(),
				}),
			})
			.await;
		}
	}

	/// Announces a freshly submitted installment agreement to the admins.
	pub async fn agreement_submitted(&self, agreement: &InstallmentAgreement) {
		self.send(Notification {
			recipient: Recipient::Admin,
			template: TemplateKind::InstallmentSubmitted,
			context: json!({
				"order_id": agreement.order_id,
				"agreement_number": agreement.agreement_number,
				"total_amount": agreement.total_amount,
			}),
		})
		.await;
	}

	/// Announces a committed order transition to the customer.
	pub async fn order_transitioned(&self, order: &Order, from: OrderStatus) {
		let template = match order.status {
			OrderStatus::Delivered => TemplateKind::OrderDelivered,
			OrderStatus::Returned => TemplateKind::OrderReturned,
			_ => TemplateKind::OrderStatusChanged,
		};
		self.send(Notification {
			recipient: Recipient::Customer(order.customer_id.clone()),
			template,
			context: json!({
				"order_id": order.id,
				"from": from,
				"status": order.status,
			}),
		})
		.await;
	}

	/// Announces a committed agreement transition.
	///
	/// Approval and rejection are customer-facing; intermediate review
	/// stages are internal bookkeeping and emit nothing.
	pub async fn agreement_transitioned(
		&self,
		agreement: &InstallmentAgreement,
		customer_id: &str,
	) {
		let template = match agreement.status {
			InstallmentStatus::Approved => TemplateKind::InstallmentApproved,
			InstallmentStatus::Rejected => TemplateKind::InstallmentRejected,
			_ => {
				tracing::debug!(
					order_id = %truncate_id(&agreement.order_id),
					status = %agreement.status,
					"Agreement review stage updated"
				);
				return;
			},
		};
		self.send(Notification {
			recipient: Recipient::Customer(customer_id.to_string()),
			template,
			context: json!({
				"order_id": agreement.order_id,
				"status": agreement.status,
				"rejection_reason": agreement.rejection_reason,
			}),
		})
		.await;
	}

	/// Announces a committed shipment transition to the customer.
	pub async fn shipment_transitioned(&self, shipment: &ShipmentRecord, customer_id: &str) {
		self.send(Notification {
			recipient: Recipient::Customer(customer_id.to_string()),
			template: TemplateKind::ShipmentStatusChanged,
			context: json!({
				"order_id": shipment.order_id,
				"status": shipment.status,
				"tracking_url": shipment.tracking_url,
			}),
		})
		.await;
	}

	/// Credits the vendor for a delivered order: subtotal minus the
	/// platform commission.
	///
	/// The engine only calls this when the pre-commit snapshot had
	/// `commission_settled == false`; the ledger independently rejects a
	/// second credit for the same order, so the write happens at most once
	/// even if the flag were ever forced back. The caller's order is
	/// already committed as Delivered, so a ledger failure is logged with
	/// the full credit values for out-of-band replay instead of being
	/// returned as an error for a transition that stood.
	pub async fn settle_commission(&self, order: &Order) {
		let Some(vendor_id) = &order.vendor_id else {
			tracing::debug!(
				order_id = %truncate_id(&order.id),
				"Delivered order has no vendor; nothing to credit"
			);
			return;
		};

		let commission = order.subtotal * self.commission_rate;
		let net = order.subtotal - commission;

		match self
			.ledger
			.credit(LedgerEntry::new(vendor_id.clone(), order.id.clone(), net))
			.await
		{
			Ok(()) => {
				tracing::info!(
					order_id = %truncate_id(&order.id),
					vendor_id = %vendor_id,
					amount = %net,
					commission = %commission,
					"Vendor ledger credited"
				);
			},
			Err(LedgerError::AlreadySettled(order_id)) => {
				tracing::warn!(
					order_id = %truncate_id(&order_id),
					vendor_id = %vendor_id,
					"Commission already settled; duplicate credit suppressed"
				);
			},
			Err(e) => {
				tracing::error!(
					order_id = %order.id,
					vendor_id = %vendor_id,
					amount = %net,
					error = %e,
					"Vendor credit failed after delivery committed; replay required"
				);
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mercato_ledger::{implementations::memory::MemoryLedger, LedgerInterface};
	use mercato_notification::implementations::memory::MemoryNotifier;
	use mercato_types::{PaymentMethod, PaymentState};
	use rust_decimal_macros::dec;

	fn dispatcher() -> (SideEffectDispatcher, MemoryNotifier, MemoryLedger) {
		let notifier = MemoryNotifier::new();
		let ledger = MemoryLedger::new();
		let dispatcher = SideEffectDispatcher::new(
			Arc::new(NotificationService::new(Box::new(notifier.clone()))),
			Arc::new(LedgerService::new(Box::new(ledger.clone()))),
			dec!(0.05),
		);
		(dispatcher, notifier, ledger)
	}

	fn delivered_order() -> Order {
		Order {
			id: "o-1".into(),
			customer_id: "c-1".into(),
			vendor_id: Some("v-1".into()),
			delivery_staff_id: Some("d-1".into()),
			status: OrderStatus::Delivered,
			payment_method: PaymentMethod::CashOnDelivery,
			payment_state: PaymentState::Unpaid,
			items: vec![],
			subtotal: dec!(100.00),
			delivery_fee: dec!(5.00),
			delivery_address: "Via Roma 1".into(),
			delivery_phone: "+39 000".into(),
			commission_settled: true,
			deleted: false,
			created_at: 0,
			updated_at: 0,
			version: 4,
		}
	}

	#[tokio::test]
	async fn delivered_order_credits_net_of_commission() {
		let (dispatcher, _, ledger) = dispatcher();
		dispatcher.settle_commission(&delivered_order()).await;
		assert_eq!(ledger.balance("v-1").await.unwrap(), dec!(95.0000));
	}

	#[tokio::test]
	async fn duplicate_settlement_is_suppressed() {
		let (dispatcher, _, ledger) = dispatcher();
		let order = delivered_order();
		dispatcher.settle_commission(&order).await;
		dispatcher.settle_commission(&order).await;
		assert_eq!(ledger.balance("v-1").await.unwrap(), dec!(95.0000));
		assert_eq!(ledger.entries("v-1").await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn vendorless_order_credits_nothing() {
		let (dispatcher, _, ledger) = dispatcher();
		let order = Order {
			vendor_id: None,
			..delivered_order()
		};
		dispatcher.settle_commission(&order).await;
		assert_eq!(ledger.balance("v-1").await.unwrap(), dec!(0));
	}

	#[tokio::test]
	async fn returned_order_notifies_with_returned_template() {
		let (dispatcher, notifier, _) = dispatcher();
		let order = Order {
			status: OrderStatus::Returned,
			commission_settled: false,
			..delivered_order()
		};
		dispatcher
			.order_transitioned(&order, OrderStatus::OutForDelivery)
			.await;

		let sent = notifier.sent();
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].template, TemplateKind::OrderReturned);
		assert_eq!(sent[0].recipient, Recipient::Customer("c-1".into()));
	}

	#[tokio::test]
	async fn intermediate_agreement_stage_emits_nothing() {
		let (dispatcher, notifier, _) = dispatcher();
		let agreement = InstallmentAgreement {
			order_id: "o-1".into(),
			agreement_number: "AGR-1".into(),
			status: InstallmentStatus::UnderReview,
			identity_documents: vec![],
			total_amount: dec!(100),
			down_payment: dec!(10),
			number_of_installments: 3,
			monthly_installment: dec!(30),
			terms_accepted: true,
			rejection_reason: None,
			created_at: 0,
			updated_at: 0,
			version: 1,
		};
		dispatcher.agreement_transitioned(&agreement, "c-1").await;
		assert!(notifier.sent().is_empty());

		let approved = InstallmentAgreement {
			status: InstallmentStatus::Approved,
			..agreement
		};
		dispatcher.agreement_transitioned(&approved, "c-1").await;
		let sent = notifier.sent();
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].template, TemplateKind::InstallmentApproved);
	}
}
