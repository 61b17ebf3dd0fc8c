//! The transition validator.
//!
//! A pure, synchronous decision function with no I/O: given the table, the
//! current state, the requested state, the actor role and the payload, it
//! either accepts or rejects with a typed reason. Rejections are terminal
//! for the call; there are no retries at this level.

use crate::{EdgeRule, TransitionError, TransitionTable};
use mercato_types::{ActorRole, TransitionPayload};
use std::fmt::Display;
use std::hash::Hash;

/// Validates one requested transition against the table.
///
/// Checks run in order: edge existence, role authorization, payload
/// presence. The first failure is returned.
pub fn validate<S>(
	table: &TransitionTable<S>,
	from: S,
	to: S,
	role: ActorRole,
	payload: &TransitionPayload,
) -> Result<(), TransitionError>
where
	S: Copy + Eq + Hash + Display,
{
	let rule = table.edge(from, to).ok_or_else(|| {
		let reason = if from == to {
			"status is already applied".to_string()
		} else {
			"no such transition".to_string()
		};
		TransitionError::InvalidTransition {
			from: from.to_string(),
			to: to.to_string(),
			reason,
		}
	})?;

	check_rule(rule, from, to, role, payload)
}

fn check_rule<S>(
	rule: &EdgeRule,
	from: S,
	to: S,
	role: ActorRole,
	payload: &TransitionPayload,
) -> Result<(), TransitionError>
where
	S: Copy + Display,
{
	if !rule.allows(role) {
		return Err(TransitionError::Unauthorized {
			role,
			from: from.to_string(),
			to: to.to_string(),
		});
	}

	if let Some(field) = rule.payload {
		if !field.is_satisfied_by(payload) {
			return Err(TransitionError::MissingPayload {
				to: to.to_string(),
				field: field.to_string(),
			});
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::table::{agreement_table, order_table};
	use mercato_types::{InspectionResult, InstallmentStatus, OrderStatus};

	#[test]
	fn accepts_legal_edge() {
		assert!(validate(
			order_table(),
			OrderStatus::Pending,
			OrderStatus::Confirmed,
			ActorRole::Admin,
			&TransitionPayload::default(),
		)
		.is_ok());
	}

	#[test]
	fn rejects_missing_edge() {
		let err = validate(
			order_table(),
			OrderStatus::Delivered,
			OrderStatus::Pending,
			ActorRole::Admin,
			&TransitionPayload::default(),
		)
		.unwrap_err();
		assert!(matches!(err, TransitionError::InvalidTransition { .. }));
	}

	#[test]
	fn reissued_transition_is_invalid_not_a_noop() {
		let err = validate(
			order_table(),
			OrderStatus::Confirmed,
			OrderStatus::Confirmed,
			ActorRole::Admin,
			&TransitionPayload::default(),
		)
		.unwrap_err();
		assert!(
			matches!(err, TransitionError::InvalidTransition { ref reason, .. } if reason.contains("already"))
		);
	}

	#[test]
	fn rejects_insufficient_role() {
		let err = validate(
			order_table(),
			OrderStatus::Pending,
			OrderStatus::Confirmed,
			ActorRole::Customer,
			&TransitionPayload::default(),
		)
		.unwrap_err();
		assert_eq!(
			err,
			TransitionError::Unauthorized {
				role: ActorRole::Customer,
				from: "PENDING".to_string(),
				to: "CONFIRMED".to_string(),
			}
		);
	}

	#[test]
	fn rejects_missing_inspection_result() {
		let err = validate(
			order_table(),
			OrderStatus::OutForDelivery,
			OrderStatus::Delivered,
			ActorRole::DeliveryStaff,
			&TransitionPayload::default(),
		)
		.unwrap_err();
		assert!(
			matches!(err, TransitionError::MissingPayload { ref field, .. } if field == "inspection_result")
		);

		assert!(validate(
			order_table(),
			OrderStatus::OutForDelivery,
			OrderStatus::Delivered,
			ActorRole::DeliveryStaff,
			&TransitionPayload::inspection(InspectionResult::Accepted),
		)
		.is_ok());
	}

	#[test]
	fn blank_rejection_reason_is_missing_payload() {
		let err = validate(
			agreement_table(),
			InstallmentStatus::Pending,
			InstallmentStatus::Rejected,
			ActorRole::Admin,
			&TransitionPayload::rejection("  "),
		)
		.unwrap_err();
		assert!(matches!(err, TransitionError::MissingPayload { .. }));
	}
}
