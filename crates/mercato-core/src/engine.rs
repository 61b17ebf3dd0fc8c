//! The status engine: the public entry point for every status mutation.
//!
//! Each request runs one read-validate-write sequence. The write goes
//! through the storage layer's compare-and-swap against the snapshot that
//! was read, so two concurrent requests against the same record cannot both
//! win; the loser sees Conflict and the engine retries it exactly once with
//! a fresh read. Side effects run strictly after the write has committed —
//! a failed persist emits nothing.

use crate::{
	table::{agreement_table, order_table, shipment_table},
	validator::validate,
	EngineError, LedgerService, NotificationService, SideEffectDispatcher, StorageError,
	StorageService, TransitionError,
};
use mercato_config::Config;
use mercato_types::{
	now_secs, truncate_id, ActorRole, InspectionResult, InstallmentAgreement, InstallmentStatus,
	Order, OrderDraft, OrderStatus, ShipmentRecord, ShipmentStatus, StorageKey,
	TransitionPayload,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Orchestrates transitions across the three coupled status dimensions of
/// a purchase record.
pub struct StatusEngine {
	config: Config,
	storage: Arc<StorageService>,
	ledger: Arc<LedgerService>,
	dispatcher: SideEffectDispatcher,
}

impl std::fmt::Debug for StatusEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StatusEngine").finish_non_exhaustive()
	}
}

impl StatusEngine {
	/// Creates a new engine over the given collaborators. The commission
	/// rate comes from the platform configuration.
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		notifications: Arc<NotificationService>,
		ledger: Arc<LedgerService>,
	) -> Self {
		let dispatcher = SideEffectDispatcher::new(
			notifications,
			Arc::clone(&ledger),
			config.platform.commission_rate,
		);
		Self {
			config,
			storage,
			ledger,
			dispatcher,
		}
	}

	/// The engine's configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Read access to the vendor ledger, consumed by the vendor console.
	pub fn ledger(&self) -> &LedgerService {
		&self.ledger
	}

	// ---- loading helpers -------------------------------------------------

	async fn load_order(&self, order_id: &str) -> Result<Order, EngineError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), order_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => EngineError::NotFound(format!("order '{}'", order_id)),
				other => EngineError::Storage(other.to_string()),
			})
	}

	async fn load_shipment(&self, order_id: &str) -> Result<ShipmentRecord, EngineError> {
		self.storage
			.retrieve(StorageKey::Shipments.as_str(), order_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => {
					EngineError::NotFound(format!("shipment for order '{}'", order_id))
				},
				other => EngineError::Storage(other.to_string()),
			})
	}

	async fn load_agreement(&self, order_id: &str) -> Result<InstallmentAgreement, EngineError> {
		self.storage
			.retrieve(StorageKey::Agreements.as_str(), order_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => {
					EngineError::NotFound(format!("installment agreement for order '{}'", order_id))
				},
				other => EngineError::Storage(other.to_string()),
			})
	}

	/// Commits an updated record only when the stored value still equals
	/// the snapshot that was read.
	async fn commit<T: Serialize>(
		&self,
		key: StorageKey,
		id: &str,
		updated: &T,
		expected: &T,
		what: &str,
	) -> Result<(), EngineError> {
		self.storage
			.update_checked(key.as_str(), id, updated, expected)
			.await
			.map_err(|e| match e {
				StorageError::Conflict => {
					EngineError::Conflict(format!("{} '{}' changed concurrently", what, id))
				},
				other => EngineError::Storage(other.to_string()),
			})
	}

	// ---- read path -------------------------------------------------------

	/// Loads one order.
	pub async fn get_order(&self, order_id: &str) -> Result<Order, EngineError> {
		self.load_order(order_id).await
	}

	/// Loads the shipment record of an order, if one was created.
	pub async fn get_shipment(&self, order_id: &str) -> Result<ShipmentRecord, EngineError> {
		self.load_shipment(order_id).await
	}

	/// Loads the installment agreement of an order, if one exists.
	pub async fn get_agreement(&self, order_id: &str) -> Result<InstallmentAgreement, EngineError> {
		self.load_agreement(order_id).await
	}

	/// Pure query used by the consoles to render available actions: the
	/// order statuses the given role may request from the current state,
	/// exactly as the transition table allows, honoring the installment
	/// gate. Deleted and terminal orders have no legal actions.
	pub async fn legal_next_states(
		&self,
		order_id: &str,
		role: ActorRole,
	) -> Result<Vec<OrderStatus>, EngineError> {
		let order = self.load_order(order_id).await?;
		if order.deleted {
			return Ok(vec![]);
		}

		let gate_open = self.installment_gate_open(&order).await?;
		let mut targets: Vec<OrderStatus> = order_table()
			.targets_for(order.status, role)
			.into_iter()
			.filter(|t| *t != OrderStatus::Confirmed || gate_open)
			.collect();
		targets.sort_by_key(|s| s.to_string());
		Ok(targets)
	}

	/// Whether the order may leave Pending with respect to its payment
	/// plan: immediate methods always may; installment plans only once the
	/// agreement is Approved.
	async fn installment_gate_open(&self, order: &Order) -> Result<bool, EngineError> {
		if !order.payment_method.is_installment() {
			return Ok(true);
		}
		let agreement = self.load_agreement(&order.id).await?;
		Ok(agreement.status == InstallmentStatus::Approved)
	}

	// ---- checkout --------------------------------------------------------

	/// Persists a new Pending order from a checkout draft, creating the
	/// installment agreement alongside when the payment plan requires one,
	/// then announces it to the vendor (and the admins for installments).
	#[instrument(skip_all, fields(customer_id = %draft.customer_id))]
	pub async fn create_order(&self, draft: OrderDraft) -> Result<Order, EngineError> {
		if draft.items.is_empty() {
			return Err(EngineError::InvalidDraft("order has no items".into()));
		}
		if draft.items.iter().any(|i| i.quantity == 0) {
			return Err(EngineError::InvalidDraft(
				"line item quantity must be at least 1".into(),
			));
		}
		if draft.delivery_fee < Decimal::ZERO {
			return Err(EngineError::InvalidDraft("delivery fee is negative".into()));
		}

		let installment_months = draft.payment_method.installment_months();
		let terms = match (installment_months, &draft.installment) {
			(Some(_), Some(terms)) if !terms.terms_accepted => {
				return Err(EngineError::InvalidDraft(
					"installment terms were not accepted".into(),
				));
			},
			(Some(_), None) => {
				return Err(EngineError::InvalidDraft(
					"installment payment method requires installment terms".into(),
				));
			},
			(Some(_), Some(terms)) => Some(terms.clone()),
			(None, _) => None,
		};

		let subtotal: Decimal = draft.items.iter().map(|i| i.line_total()).sum();
		let now = now_secs();
		let id = Uuid::new_v4().to_string();

		let order = Order {
			id: id.clone(),
			customer_id: draft.customer_id,
			vendor_id: draft.vendor_id,
			delivery_staff_id: None,
			status: OrderStatus::Pending,
			payment_method: draft.payment_method,
			payment_state: mercato_types::PaymentState::Unpaid,
			items: draft.items,
			subtotal,
			delivery_fee: draft.delivery_fee,
			delivery_address: draft.delivery_address,
			delivery_phone: draft.delivery_phone,
			commission_settled: false,
			deleted: false,
			created_at: now,
			updated_at: now,
			version: 0,
		};

		self.storage
			.insert(StorageKey::Orders.as_str(), &id, &order)
			.await
			.map_err(|e| EngineError::Storage(e.to_string()))?;

		let agreement = match (installment_months, terms) {
			(Some(months), Some(terms)) => {
				let agreement = InstallmentAgreement {
					order_id: id.clone(),
					agreement_number: format!("AGR-{}", &id[..8]),
					status: InstallmentStatus::Pending,
					identity_documents: terms.identity_documents,
					total_amount: order.final_amount(),
					down_payment: terms.down_payment,
					number_of_installments: months,
					monthly_installment: terms.monthly_installment,
					terms_accepted: terms.terms_accepted,
					rejection_reason: None,
					created_at: now,
					updated_at: now,
					version: 0,
				};
				self.storage
					.insert(StorageKey::Agreements.as_str(), &id, &agreement)
					.await
					.map_err(|e| EngineError::Storage(e.to_string()))?;
				Some(agreement)
			},
			_ => None,
		};

		tracing::info!(
			order_id = %truncate_id(&id),
			subtotal = %subtotal,
			installment = agreement.is_some(),
			"Order created"
		);

		self.dispatcher.order_created(&order).await;
		if let Some(agreement) = &agreement {
			self.dispatcher.agreement_submitted(agreement).await;
		}

		Ok(order)
	}

	// ---- order transitions -----------------------------------------------

	/// Applies one order status transition: load, validate, commit via
	/// compare-and-swap, then dispatch side effects. A concurrent-write
	/// conflict is retried exactly once with a fresh read; every other
	/// rejection is terminal for this call.
	#[instrument(skip(self, payload), fields(order_id = %truncate_id(order_id), target = %target, role = %role))]
	pub async fn request_order_transition(
		&self,
		order_id: &str,
		target: OrderStatus,
		role: ActorRole,
		payload: &TransitionPayload,
	) -> Result<Order, EngineError> {
		match self.try_order_transition(order_id, target, role, payload).await {
			Err(EngineError::Conflict(_)) => {
				tracing::warn!("Concurrent write detected; retrying once");
				self.try_order_transition(order_id, target, role, payload).await
			},
			other => other,
		}
	}

	async fn try_order_transition(
		&self,
		order_id: &str,
		target: OrderStatus,
		role: ActorRole,
		payload: &TransitionPayload,
	) -> Result<Order, EngineError> {
		let snapshot = self.load_order(order_id).await?;
		if snapshot.deleted {
			return Err(TransitionError::InvalidTransition {
				from: snapshot.status.to_string(),
				to: target.to_string(),
				reason: "order is deleted".into(),
			}
			.into());
		}

		validate(order_table(), snapshot.status, target, role, payload)?;

		if snapshot.status == OrderStatus::Pending
			&& target == OrderStatus::Confirmed
			&& !self.installment_gate_open(&snapshot).await?
		{
			return Err(TransitionError::InvalidTransition {
				from: snapshot.status.to_string(),
				to: target.to_string(),
				reason: "installment agreement is not approved".into(),
			}
			.into());
		}

		// Delivery fan-out: the inspection result decides whether the
		// parcel commits as Delivered or Returned.
		let effective = match (target, payload.inspection_result) {
			(OrderStatus::Delivered | OrderStatus::Returned, Some(InspectionResult::Rejected)) => {
				OrderStatus::Returned
			},
			(OrderStatus::Delivered | OrderStatus::Returned, Some(InspectionResult::Accepted)) => {
				OrderStatus::Delivered
			},
			_ => target,
		};

		let settle = effective == OrderStatus::Delivered && !snapshot.commission_settled;

		let mut updated = snapshot.clone();
		updated.status = effective;
		updated.updated_at = now_secs();
		updated.version += 1;
		if settle {
			// Flag and status change commit in the same write.
			updated.commission_settled = true;
		}

		self.commit(StorageKey::Orders, order_id, &updated, &snapshot, "order")
			.await?;

		tracing::info!(
			from = %snapshot.status,
			to = %effective,
			version = updated.version,
			"Order transition committed"
		);

		// Persist-then-notify, never the other way around.
		self.dispatcher.order_transitioned(&updated, snapshot.status).await;
		if settle {
			self.dispatcher.settle_commission(&updated).await;
		}

		Ok(updated)
	}

	/// Soft-deletes an order. Rows are never physically removed; a deleted
	/// order simply stops accepting transitions. Admin only, idempotent.
	#[instrument(skip(self), fields(order_id = %truncate_id(order_id), role = %role))]
	pub async fn soft_delete_order(
		&self,
		order_id: &str,
		role: ActorRole,
	) -> Result<Order, EngineError> {
		if role != ActorRole::Admin {
			return Err(EngineError::Forbidden {
				role,
				action: "delete orders".into(),
			});
		}

		let snapshot = self.load_order(order_id).await?;
		if snapshot.deleted {
			return Ok(snapshot);
		}

		let mut updated = snapshot.clone();
		updated.deleted = true;
		updated.updated_at = now_secs();
		updated.version += 1;

		self.commit(StorageKey::Orders, order_id, &updated, &snapshot, "order")
			.await?;
		tracing::info!("Order soft-deleted");
		Ok(updated)
	}

	// ---- shipments -------------------------------------------------------

	/// Creates the carrier shipment record for an order. Admin only; the
	/// order must have reached a dispatch-eligible state, and at most one
	/// shipment exists per order.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), role = %role))]
	pub async fn create_shipment(
		&self,
		order_id: &str,
		role: ActorRole,
		carrier_shipment_id: Option<String>,
		tracking_url: Option<String>,
		carrier_notes: Option<String>,
	) -> Result<ShipmentRecord, EngineError> {
		if role != ActorRole::Admin {
			return Err(EngineError::Forbidden {
				role,
				action: "create shipment records".into(),
			});
		}

		let order = self.load_order(order_id).await?;
		if !order.status.is_dispatch_eligible() {
			return Err(EngineError::NotDispatchEligible {
				order_id: order_id.to_string(),
				status: order.status.to_string(),
			});
		}

		let now = now_secs();
		let shipment = ShipmentRecord {
			order_id: order_id.to_string(),
			carrier_shipment_id,
			status: ShipmentStatus::Pending,
			tracking_url,
			carrier_notes,
			sent_at: None,
			created_at: now,
			updated_at: now,
			version: 0,
		};

		self.storage
			.insert(StorageKey::Shipments.as_str(), order_id, &shipment)
			.await
			.map_err(|e| match e {
				StorageError::Conflict => EngineError::Conflict(format!(
					"shipment for order '{}' already exists",
					order_id
				)),
				other => EngineError::Storage(other.to_string()),
			})?;

		tracing::info!("Shipment record created");
		Ok(shipment)
	}

	/// Applies one shipment status transition, attaching any carrier
	/// metadata carried in the payload. Retried once on conflict.
	#[instrument(skip(self, payload), fields(order_id = %truncate_id(order_id), target = %target, role = %role))]
	pub async fn request_shipment_transition(
		&self,
		order_id: &str,
		target: ShipmentStatus,
		role: ActorRole,
		payload: &TransitionPayload,
	) -> Result<ShipmentRecord, EngineError> {
		match self
			.try_shipment_transition(order_id, target, role, payload)
			.await
		{
			Err(EngineError::Conflict(_)) => {
				tracing::warn!("Concurrent write detected; retrying once");
				self.try_shipment_transition(order_id, target, role, payload).await
			},
			other => other,
		}
	}

	async fn try_shipment_transition(
		&self,
		order_id: &str,
		target: ShipmentStatus,
		role: ActorRole,
		payload: &TransitionPayload,
	) -> Result<ShipmentRecord, EngineError> {
		let order = self.load_order(order_id).await?;
		let snapshot = self.load_shipment(order_id).await?;

		validate(shipment_table(), snapshot.status, target, role, payload)?;

		let now = now_secs();
		let mut updated = snapshot.clone();
		updated.status = target;
		updated.updated_at = now;
		updated.version += 1;
		if let Some(id) = &payload.carrier_shipment_id {
			updated.carrier_shipment_id = Some(id.clone());
		}
		if let Some(url) = &payload.tracking_url {
			updated.tracking_url = Some(url.clone());
		}
		if let Some(notes) = &payload.carrier_notes {
			updated.carrier_notes = Some(notes.clone());
		}
		if target == ShipmentStatus::SentToBusta && updated.sent_at.is_none() {
			updated.sent_at = Some(now);
		}

		self.commit(StorageKey::Shipments, order_id, &updated, &snapshot, "shipment")
			.await?;

		tracing::info!(
			from = %snapshot.status,
			to = %target,
			"Shipment transition committed"
		);

		self.dispatcher
			.shipment_transitioned(&updated, &order.customer_id)
			.await;
		Ok(updated)
	}

	// ---- installment agreements -------------------------------------------

	/// Applies one installment agreement transition. Admin-driven;
	/// rejection records its reason on the agreement. Retried once on
	/// conflict.
	#[instrument(skip(self, payload), fields(order_id = %truncate_id(order_id), target = %target, role = %role))]
	pub async fn request_agreement_transition(
		&self,
		order_id: &str,
		target: InstallmentStatus,
		role: ActorRole,
		payload: &TransitionPayload,
	) -> Result<InstallmentAgreement, EngineError> {
		match self
			.try_agreement_transition(order_id, target, role, payload)
			.await
		{
			Err(EngineError::Conflict(_)) => {
				tracing::warn!("Concurrent write detected; retrying once");
				self.try_agreement_transition(order_id, target, role, payload).await
			},
			other => other,
		}
	}

	async fn try_agreement_transition(
		&self,
		order_id: &str,
		target: InstallmentStatus,
		role: ActorRole,
		payload: &TransitionPayload,
	) -> Result<InstallmentAgreement, EngineError> {
		let order = self.load_order(order_id).await?;
		let snapshot = self.load_agreement(order_id).await?;

		validate(agreement_table(), snapshot.status, target, role, payload)?;

		let mut updated = snapshot.clone();
		updated.status = target;
		updated.updated_at = now_secs();
		updated.version += 1;
		if target == InstallmentStatus::Rejected {
			updated.rejection_reason = payload.rejection_reason.clone();
		}

		self.commit(StorageKey::Agreements, order_id, &updated, &snapshot, "agreement")
			.await?;

		tracing::info!(
			from = %snapshot.status,
			to = %target,
			"Agreement transition committed"
		);

		// Approval carries no monetary effect; settlement is deferred
		// until the order itself reaches Delivered.
		self.dispatcher
			.agreement_transitioned(&updated, &order.customer_id)
			.await;
		Ok(updated)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mercato_ledger::{
		implementations::memory::{MemoryLedger, MemoryLedgerSchema},
		LedgerEntry, LedgerError, LedgerInterface,
	};
	use mercato_notification::implementations::memory::MemoryNotifier;
	use mercato_storage::implementations::memory::MemoryStorage;
	use mercato_types::{InstallmentTerms, OrderItem, PaymentMethod, TemplateKind};
	use rust_decimal_macros::dec;

	const TEST_CONFIG: &str = r#"
[platform]
id = "mercato-test"

[storage]
primary = "memory"
[storage.implementations.memory]

[notification]
primary = "memory"
[notification.implementations.memory]

[ledger]
primary = "memory"
[ledger.implementations.memory]
"#;

	fn setup() -> (StatusEngine, MemoryNotifier, MemoryLedger) {
		let config: Config = TEST_CONFIG.parse().unwrap();
		let notifier = MemoryNotifier::new();
		let ledger = MemoryLedger::new();
		let engine = StatusEngine::new(
			config,
			Arc::new(StorageService::new(Box::new(MemoryStorage::new()))),
			Arc::new(NotificationService::new(Box::new(notifier.clone()))),
			Arc::new(LedgerService::new(Box::new(ledger.clone()))),
		);
		(engine, notifier, ledger)
	}

	fn cod_draft() -> OrderDraft {
		OrderDraft {
			customer_id: "c-1".into(),
			vendor_id: Some("v-1".into()),
			payment_method: PaymentMethod::CashOnDelivery,
			items: vec![OrderItem {
				product_id: "p-1".into(),
				name: "Widget".into(),
				quantity: 2,
				unit_price: dec!(50.00),
			}],
			delivery_fee: dec!(5.00),
			delivery_address: "Via Roma 1".into(),
			delivery_phone: "+39 000".into(),
			installment: None,
		}
	}

	fn installment_draft() -> OrderDraft {
		OrderDraft {
			payment_method: PaymentMethod::Installment3,
			installment: Some(InstallmentTerms {
				down_payment: dec!(15.00),
				monthly_installment: dec!(30.00),
				identity_documents: vec!["doc-1".into()],
				terms_accepted: true,
			}),
			..cod_draft()
		}
	}

	/// Walks an order to OutForDelivery via the normal chain.
	async fn advance_to_out_for_delivery(engine: &StatusEngine, order_id: &str) {
		let none = TransitionPayload::default();
		for (target, role) in [
			(OrderStatus::Confirmed, ActorRole::Admin),
			(OrderStatus::Preparing, ActorRole::Vendor),
			(OrderStatus::OutForDelivery, ActorRole::System),
		] {
			engine
				.request_order_transition(order_id, target, role, &none)
				.await
				.unwrap();
		}
	}

	#[tokio::test]
	async fn create_order_starts_pending_and_notifies_vendor() {
		let (engine, notifier, _) = setup();
		let order = engine.create_order(cod_draft()).await.unwrap();

		assert_eq!(order.status, OrderStatus::Pending);
		assert_eq!(order.subtotal, dec!(100.00));
		assert_eq!(order.final_amount(), dec!(105.00));
		assert!(!order.commission_settled);

		let sent = notifier.sent();
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].template, TemplateKind::NewOrder);
	}

	#[tokio::test]
	async fn create_order_rejects_bad_drafts() {
		let (engine, _, _) = setup();

		let empty = OrderDraft {
			items: vec![],
			..cod_draft()
		};
		assert!(matches!(
			engine.create_order(empty).await,
			Err(EngineError::InvalidDraft(_))
		));

		let missing_terms = OrderDraft {
			payment_method: PaymentMethod::Installment6,
			installment: None,
			..cod_draft()
		};
		assert!(matches!(
			engine.create_order(missing_terms).await,
			Err(EngineError::InvalidDraft(_))
		));
	}

	#[tokio::test]
	async fn happy_path_credits_vendor_exactly_once() {
		let (engine, notifier, ledger) = setup();
		let order = engine.create_order(cod_draft()).await.unwrap();
		advance_to_out_for_delivery(&engine, &order.id).await;

		let delivered = engine
			.request_order_transition(
				&order.id,
				OrderStatus::Delivered,
				ActorRole::DeliveryStaff,
				&TransitionPayload::inspection(InspectionResult::Accepted),
			)
			.await
			.unwrap();

		assert_eq!(delivered.status, OrderStatus::Delivered);
		assert!(delivered.commission_settled);
		// subtotal 100.00 at a 5% commission rate.
		assert_eq!(ledger.balance("v-1").await.unwrap(), dec!(95.00));

		// Delivered is terminal; re-entering it is rejected and the ledger
		// is untouched.
		let err = engine
			.request_order_transition(
				&order.id,
				OrderStatus::Delivered,
				ActorRole::DeliveryStaff,
				&TransitionPayload::inspection(InspectionResult::Accepted),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			EngineError::Transition(TransitionError::InvalidTransition { .. })
		));
		assert_eq!(ledger.balance("v-1").await.unwrap(), dec!(95.00));

		let delivered_notices = notifier
			.sent()
			.iter()
			.filter(|n| n.template == TemplateKind::OrderDelivered)
			.count();
		assert_eq!(delivered_notices, 1);
	}

	#[tokio::test]
	async fn illegal_transition_leaves_state_unchanged() {
		let (engine, _, _) = setup();
		let order = engine.create_order(cod_draft()).await.unwrap();

		let err = engine
			.request_order_transition(
				&order.id,
				OrderStatus::Delivered,
				ActorRole::Admin,
				&TransitionPayload::default(),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			EngineError::Transition(TransitionError::InvalidTransition { .. })
		));

		let stored = engine.get_order(&order.id).await.unwrap();
		assert_eq!(stored.status, OrderStatus::Pending);
		assert_eq!(stored.version, 0);
	}

	#[tokio::test]
	async fn unauthorized_role_leaves_state_unchanged() {
		let (engine, _, _) = setup();
		let order = engine.create_order(cod_draft()).await.unwrap();

		let err = engine
			.request_order_transition(
				&order.id,
				OrderStatus::Confirmed,
				ActorRole::Vendor,
				&TransitionPayload::default(),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			EngineError::Transition(TransitionError::Unauthorized { .. })
		));

		let stored = engine.get_order(&order.id).await.unwrap();
		assert_eq!(stored.status, OrderStatus::Pending);
	}

	#[tokio::test]
	async fn missing_inspection_result_fires_no_side_effects() {
		let (engine, notifier, ledger) = setup();
		let order = engine.create_order(cod_draft()).await.unwrap();
		advance_to_out_for_delivery(&engine, &order.id).await;
		let sent_before = notifier.sent().len();

		let err = engine
			.request_order_transition(
				&order.id,
				OrderStatus::Delivered,
				ActorRole::DeliveryStaff,
				&TransitionPayload::default(),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			EngineError::Transition(TransitionError::MissingPayload { .. })
		));

		assert_eq!(notifier.sent().len(), sent_before);
		assert_eq!(ledger.balance("v-1").await.unwrap(), dec!(0));
		let stored = engine.get_order(&order.id).await.unwrap();
		assert_eq!(stored.status, OrderStatus::OutForDelivery);
	}

	#[tokio::test]
	async fn rejected_inspection_fans_out_to_returned() {
		let (engine, notifier, ledger) = setup();
		let order = engine.create_order(cod_draft()).await.unwrap();
		advance_to_out_for_delivery(&engine, &order.id).await;

		let returned = engine
			.request_order_transition(
				&order.id,
				OrderStatus::Delivered,
				ActorRole::DeliveryStaff,
				&TransitionPayload::inspection(InspectionResult::Rejected),
			)
			.await
			.unwrap();

		assert_eq!(returned.status, OrderStatus::Returned);
		assert!(!returned.commission_settled);
		assert_eq!(ledger.balance("v-1").await.unwrap(), dec!(0));

		let returned_notices = notifier
			.sent()
			.iter()
			.filter(|n| n.template == TemplateKind::OrderReturned)
			.count();
		assert_eq!(returned_notices, 1);
	}

	#[tokio::test]
	async fn installment_gate_blocks_confirmation_until_approval() {
		let (engine, notifier, _) = setup();
		let order = engine.create_order(installment_draft()).await.unwrap();

		// Admins were told about the submission.
		assert!(notifier
			.sent()
			.iter()
			.any(|n| n.template == TemplateKind::InstallmentSubmitted));

		// Confirmation is gated on the agreement.
		let err = engine
			.request_order_transition(
				&order.id,
				OrderStatus::Confirmed,
				ActorRole::Admin,
				&TransitionPayload::default(),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			EngineError::Transition(TransitionError::InvalidTransition { reason, .. })
				if reason.contains("not approved")
		));

		// Only admins may approve.
		let err = engine
			.request_agreement_transition(
				&order.id,
				InstallmentStatus::Approved,
				ActorRole::Vendor,
				&TransitionPayload::default(),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			EngineError::Transition(TransitionError::Unauthorized { .. })
		));

		// Approval needs no payload and opens the gate.
		let agreement = engine
			.request_agreement_transition(
				&order.id,
				InstallmentStatus::Approved,
				ActorRole::Admin,
				&TransitionPayload::default(),
			)
			.await
			.unwrap();
		assert_eq!(agreement.status, InstallmentStatus::Approved);
		assert!(notifier
			.sent()
			.iter()
			.any(|n| n.template == TemplateKind::InstallmentApproved));

		let confirmed = engine
			.request_order_transition(
				&order.id,
				OrderStatus::Confirmed,
				ActorRole::Admin,
				&TransitionPayload::default(),
			)
			.await
			.unwrap();
		assert_eq!(confirmed.status, OrderStatus::Confirmed);
	}

	#[tokio::test]
	async fn agreement_rejection_requires_reason_and_records_it() {
		let (engine, _, _) = setup();
		let order = engine.create_order(installment_draft()).await.unwrap();

		let err = engine
			.request_agreement_transition(
				&order.id,
				InstallmentStatus::Rejected,
				ActorRole::Admin,
				&TransitionPayload::default(),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			EngineError::Transition(TransitionError::MissingPayload { field, .. })
				if field == "rejection_reason"
		));

		let rejected = engine
			.request_agreement_transition(
				&order.id,
				InstallmentStatus::Rejected,
				ActorRole::Admin,
				&TransitionPayload::rejection("identity documents illegible"),
			)
			.await
			.unwrap();
		assert_eq!(rejected.status, InstallmentStatus::Rejected);
		assert_eq!(
			rejected.rejection_reason.as_deref(),
			Some("identity documents illegible")
		);
	}

	#[tokio::test]
	async fn concurrent_transitions_serialize_to_one_winner_per_write() {
		let (engine, _, _) = setup();
		let order = engine.create_order(cod_draft()).await.unwrap();
		let none = TransitionPayload::default();

		// Two actors race from Pending: an admin confirming and the
		// customer cancelling. The compare-and-swap write plus the single
		// bounded retry admits at most one of each into the final history.
		let (confirm, cancel) = tokio::join!(
			engine.request_order_transition(
				&order.id,
				OrderStatus::Confirmed,
				ActorRole::Admin,
				&none
			),
			engine.request_order_transition(
				&order.id,
				OrderStatus::Cancelled,
				ActorRole::Customer,
				&none
			),
		);

		let stored = engine.get_order(&order.id).await.unwrap();
		match (&confirm, &cancel) {
			(Ok(_), Ok(_)) => panic!("both writers cannot win from Pending"),
			(Ok(o), Err(_)) => assert_eq!(stored.status, o.status),
			(Err(_), Ok(o)) => assert_eq!(stored.status, o.status),
			(Err(_), Err(_)) => panic!("at least one writer must win"),
		}
		assert_eq!(stored.version, 1);
	}

	#[tokio::test]
	async fn legal_next_states_reflect_role_and_gate() {
		let (engine, _, _) = setup();
		let order = engine.create_order(cod_draft()).await.unwrap();

		let admin = engine
			.legal_next_states(&order.id, ActorRole::Admin)
			.await
			.unwrap();
		assert_eq!(
			admin,
			vec![
				OrderStatus::Cancelled,
				OrderStatus::Confirmed,
				OrderStatus::Rejected
			]
		);

		let customer = engine
			.legal_next_states(&order.id, ActorRole::Customer)
			.await
			.unwrap();
		assert_eq!(customer, vec![OrderStatus::Cancelled]);

		// The gate hides Confirmed for installment orders until approval.
		let gated = engine.create_order(installment_draft()).await.unwrap();
		let admin_gated = engine
			.legal_next_states(&gated.id, ActorRole::Admin)
			.await
			.unwrap();
		assert!(!admin_gated.contains(&OrderStatus::Confirmed));
		assert!(admin_gated.contains(&OrderStatus::Rejected));
	}

	#[tokio::test]
	async fn terminal_and_deleted_orders_have_no_actions() {
		let (engine, _, _) = setup();
		let order = engine.create_order(cod_draft()).await.unwrap();
		engine
			.request_order_transition(
				&order.id,
				OrderStatus::Cancelled,
				ActorRole::Customer,
				&TransitionPayload::default(),
			)
			.await
			.unwrap();
		assert!(engine
			.legal_next_states(&order.id, ActorRole::Admin)
			.await
			.unwrap()
			.is_empty());

		let second = engine.create_order(cod_draft()).await.unwrap();
		engine
			.soft_delete_order(&second.id, ActorRole::Admin)
			.await
			.unwrap();
		assert!(engine
			.legal_next_states(&second.id, ActorRole::Admin)
			.await
			.unwrap()
			.is_empty());
	}

	#[tokio::test]
	async fn soft_delete_is_admin_only_and_blocks_transitions() {
		let (engine, _, _) = setup();
		let order = engine.create_order(cod_draft()).await.unwrap();

		let err = engine
			.soft_delete_order(&order.id, ActorRole::Vendor)
			.await
			.unwrap_err();
		assert!(matches!(err, EngineError::Forbidden { .. }));

		let deleted = engine
			.soft_delete_order(&order.id, ActorRole::Admin)
			.await
			.unwrap();
		assert!(deleted.deleted);

		let err = engine
			.request_order_transition(
				&order.id,
				OrderStatus::Confirmed,
				ActorRole::Admin,
				&TransitionPayload::default(),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			EngineError::Transition(TransitionError::InvalidTransition { reason, .. })
				if reason.contains("deleted")
		));
	}

	#[tokio::test]
	async fn shipment_requires_dispatch_eligibility() {
		let (engine, _, _) = setup();
		let order = engine.create_order(cod_draft()).await.unwrap();

		let err = engine
			.create_shipment(&order.id, ActorRole::Admin, None, None, None)
			.await
			.unwrap_err();
		assert!(matches!(err, EngineError::NotDispatchEligible { .. }));

		let err = engine
			.create_shipment(&order.id, ActorRole::Vendor, None, None, None)
			.await
			.unwrap_err();
		assert!(matches!(err, EngineError::Forbidden { .. }));
	}

	#[tokio::test]
	async fn shipment_lifecycle_tracks_carrier_metadata() {
		let (engine, notifier, _) = setup();
		let order = engine.create_order(cod_draft()).await.unwrap();
		let none = TransitionPayload::default();
		engine
			.request_order_transition(&order.id, OrderStatus::Confirmed, ActorRole::Admin, &none)
			.await
			.unwrap();
		engine
			.request_order_transition(&order.id, OrderStatus::Preparing, ActorRole::Vendor, &none)
			.await
			.unwrap();

		let shipment = engine
			.create_shipment(&order.id, ActorRole::Admin, None, None, None)
			.await
			.unwrap();
		assert_eq!(shipment.status, ShipmentStatus::Pending);
		assert!(shipment.sent_at.is_none());

		// A second shipment for the same order is rejected.
		let err = engine
			.create_shipment(&order.id, ActorRole::Admin, None, None, None)
			.await
			.unwrap_err();
		assert!(matches!(err, EngineError::Conflict(_)));

		let payload = TransitionPayload {
			carrier_shipment_id: Some("BUSTA-42".into()),
			tracking_url: Some("https://busta.example/t/42".into()),
			..TransitionPayload::default()
		};
		let sent = engine
			.request_shipment_transition(
				&order.id,
				ShipmentStatus::SentToBusta,
				ActorRole::Admin,
				&payload,
			)
			.await
			.unwrap();
		assert_eq!(sent.status, ShipmentStatus::SentToBusta);
		assert!(sent.sent_at.is_some());
		assert_eq!(sent.carrier_shipment_id.as_deref(), Some("BUSTA-42"));

		// The carrier chain cannot be skipped.
		let err = engine
			.request_shipment_transition(
				&order.id,
				ShipmentStatus::Delivered,
				ActorRole::Admin,
				&TransitionPayload::default(),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			EngineError::Transition(TransitionError::InvalidTransition { .. })
		));

		// Only admins relay carrier updates.
		let err = engine
			.request_shipment_transition(
				&order.id,
				ShipmentStatus::PickedUp,
				ActorRole::Vendor,
				&TransitionPayload::default(),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			EngineError::Transition(TransitionError::Unauthorized { .. })
		));

		assert!(notifier
			.sent()
			.iter()
			.any(|n| n.template == TemplateKind::ShipmentStatusChanged));
	}

	/// Ledger backend whose credit calls always fail, standing in for a
	/// transient outage.
	#[derive(Clone, Default)]
	struct OfflineLedger;

	#[async_trait::async_trait]
	impl LedgerInterface for OfflineLedger {
		async fn credit(&self, _entry: LedgerEntry) -> Result<(), LedgerError> {
			Err(LedgerError::Backend("ledger unreachable".into()))
		}

		async fn balance(&self, _vendor_id: &str) -> Result<Decimal, LedgerError> {
			Ok(Decimal::ZERO)
		}

		async fn entries(&self, _vendor_id: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
			Ok(vec![])
		}

		fn config_schema(&self) -> Box<dyn mercato_types::ConfigSchema> {
			Box::new(MemoryLedgerSchema)
		}
	}

	#[tokio::test]
	async fn ledger_outage_does_not_unwind_committed_delivery() {
		let config: Config = TEST_CONFIG.parse().unwrap();
		let notifier = MemoryNotifier::new();
		let engine = StatusEngine::new(
			config,
			Arc::new(StorageService::new(Box::new(MemoryStorage::new()))),
			Arc::new(NotificationService::new(Box::new(notifier.clone()))),
			Arc::new(LedgerService::new(Box::new(OfflineLedger))),
		);

		let order = engine.create_order(cod_draft()).await.unwrap();
		advance_to_out_for_delivery(&engine, &order.id).await;

		// The transition committed before the credit was attempted, so the
		// caller sees the delivered order even though the credit failed.
		let delivered = engine
			.request_order_transition(
				&order.id,
				OrderStatus::Delivered,
				ActorRole::DeliveryStaff,
				&TransitionPayload::inspection(InspectionResult::Accepted),
			)
			.await
			.unwrap();
		assert_eq!(delivered.status, OrderStatus::Delivered);

		let stored = engine.get_order(&order.id).await.unwrap();
		assert_eq!(stored.status, OrderStatus::Delivered);
		assert!(stored.commission_settled);
		assert!(notifier
			.sent()
			.iter()
			.any(|n| n.template == TemplateKind::OrderDelivered));
	}

	#[tokio::test]
	async fn unknown_order_is_not_found() {
		let (engine, _, _) = setup();
		let err = engine
			.request_order_transition(
				"missing",
				OrderStatus::Confirmed,
				ActorRole::Admin,
				&TransitionPayload::default(),
			)
			.await
			.unwrap_err();
		assert!(matches!(err, EngineError::NotFound(_)));
	}
}
