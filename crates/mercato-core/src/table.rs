//! The transition tables: the authoritative contract for status changes.
//!
//! Each status space has its own table mapping (from, to) pairs to an
//! EdgeRule naming the roles allowed to drive the edge and the payload field
//! it requires. Everything the validator and the legal-actions query know
//! about legality comes from here; there is no other source of truth.
//!
//! The tables deliberately contain no self-edges, so re-issuing an
//! already-applied transition is rejected rather than silently accepted.

use mercato_types::{ActorRole, InstallmentStatus, OrderStatus, PayloadField, ShipmentStatus};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::hash::Hash;

/// Rule attached to one edge of a transition table.
#[derive(Debug, Clone)]
pub struct EdgeRule {
	/// Roles permitted to drive this edge.
	pub roles: Vec<ActorRole>,
	/// Payload field the edge requires, if any.
	pub payload: Option<PayloadField>,
}

impl EdgeRule {
	fn new(roles: &[ActorRole]) -> Self {
		Self {
			roles: roles.to_vec(),
			payload: None,
		}
	}

	fn with_payload(roles: &[ActorRole], payload: PayloadField) -> Self {
		Self {
			roles: roles.to_vec(),
			payload: Some(payload),
		}
	}

	/// Whether the given role may drive this edge.
	pub fn allows(&self, role: ActorRole) -> bool {
		self.roles.contains(&role)
	}
}

/// A closed set of legal edges over one status space.
#[derive(Debug)]
pub struct TransitionTable<S> {
	edges: HashMap<(S, S), EdgeRule>,
}

impl<S> Default for TransitionTable<S> {
	fn default() -> Self {
		Self {
			edges: HashMap::new(),
		}
	}
}

impl<S: Copy + Eq + Hash> TransitionTable<S> {
	fn insert(&mut self, from: S, to: S, rule: EdgeRule) {
		self.edges.insert((from, to), rule);
	}

	/// Looks up the rule for an edge, or None when the edge is illegal.
	pub fn edge(&self, from: S, to: S) -> Option<&EdgeRule> {
		self.edges.get(&(from, to))
	}

	/// All states reachable from `from` by the given role.
	pub fn targets_for(&self, from: S, role: ActorRole) -> Vec<S> {
		self.edges
			.iter()
			.filter(|((f, _), rule)| *f == from && rule.allows(role))
			.map(|((_, t), _)| *t)
			.collect()
	}
}

use ActorRole::{Admin, Customer, DeliveryStaff, System, Vendor};

static ORDER_TABLE: Lazy<TransitionTable<OrderStatus>> = Lazy::new(|| {
	use OrderStatus::*;
	let mut t = TransitionTable::default();

	t.insert(Pending, Confirmed, EdgeRule::new(&[Admin]));
	t.insert(Confirmed, Preparing, EdgeRule::new(&[Vendor, Admin]));
	t.insert(Preparing, OutForDelivery, EdgeRule::new(&[System, Admin]));
	t.insert(
		OutForDelivery,
		Delivered,
		EdgeRule::with_payload(&[DeliveryStaff], PayloadField::InspectionResult),
	);
	t.insert(
		OutForDelivery,
		Returned,
		EdgeRule::with_payload(&[DeliveryStaff], PayloadField::InspectionResult),
	);

	for from in OrderStatus::all().filter(|s| !s.is_terminal()) {
		t.insert(from, Rejected, EdgeRule::new(&[Vendor, Admin]));
		// Customers may only cancel while the order is still Pending.
		let cancel_roles: &[ActorRole] = if from == Pending {
			&[Customer, Admin]
		} else {
			&[Admin]
		};
		t.insert(from, Cancelled, EdgeRule::new(cancel_roles));
	}

	t
});

static SHIPMENT_TABLE: Lazy<TransitionTable<ShipmentStatus>> = Lazy::new(|| {
	use ShipmentStatus::*;
	let mut t = TransitionTable::default();

	// The carrier chain; the admin console relays carrier updates.
	for (from, to) in [
		(Pending, SentToBusta),
		(SentToBusta, PickedUp),
		(PickedUp, InTransit),
		(InTransit, OutForDelivery),
		(OutForDelivery, Delivered),
	] {
		t.insert(from, to, EdgeRule::new(&[Admin]));
	}

	for from in ShipmentStatus::all().filter(|s| !s.is_terminal()) {
		for to in [Attempted, Returned, Cancelled, Exception] {
			t.insert(from, to, EdgeRule::new(&[Admin]));
		}
	}

	t
});

static AGREEMENT_TABLE: Lazy<TransitionTable<InstallmentStatus>> = Lazy::new(|| {
	use InstallmentStatus::*;
	let mut t = TransitionTable::default();

	t.insert(Pending, DocumentsComplete, EdgeRule::new(&[Admin]));
	t.insert(DocumentsComplete, UnderReview, EdgeRule::new(&[Admin]));

	// Approval requires no payload and may skip ahead from any review
	// stage; rejection always requires a reason. No edge leads to Expired.
	for from in InstallmentStatus::all().filter(|s| !s.is_terminal()) {
		t.insert(from, Approved, EdgeRule::new(&[Admin]));
		t.insert(
			from,
			Rejected,
			EdgeRule::with_payload(&[Admin], PayloadField::RejectionReason),
		);
	}

	t
});

/// The order fulfillment transition table.
pub fn order_table() -> &'static TransitionTable<OrderStatus> {
	&ORDER_TABLE
}

/// The carrier shipment transition table.
pub fn shipment_table() -> &'static TransitionTable<ShipmentStatus> {
	&SHIPMENT_TABLE
}

/// The installment agreement transition table.
pub fn agreement_table() -> &'static TransitionTable<InstallmentStatus> {
	&AGREEMENT_TABLE
}
