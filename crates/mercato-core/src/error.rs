//! Error types for the status engine.
//!
//! Every rejection carries a reason string suitable for verbatim display in
//! the consoles; nothing here is ever panicked or silently swallowed.

use mercato_types::{APIError, ActorRole};
use thiserror::Error;

/// Rejection produced by the transition validator.
///
/// These are terminal for the call that triggered them: the caller must
/// re-request with a corrected target, role or payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
	/// The requested edge does not exist in the transition table for the
	/// current state. Re-issuing an already-applied transition lands here
	/// too, since the table contains no self-edges.
	#[error("Cannot move from {from} to {to}: {reason}")]
	InvalidTransition {
		from: String,
		to: String,
		reason: String,
	},
	/// The actor role is insufficient for the requested edge.
	#[error("Role '{role}' may not move this record from {from} to {to}")]
	Unauthorized {
		role: ActorRole,
		from: String,
		to: String,
	},
	/// The edge requires auxiliary data that was not supplied.
	#[error("Transition to {to} requires field '{field}'")]
	MissingPayload { to: String, field: String },
}

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	/// The transition was rejected by the validator.
	#[error(transparent)]
	Transition(#[from] TransitionError),
	/// The referenced record does not exist.
	#[error("Not found: {0}")]
	NotFound(String),
	/// The record changed concurrently since it was read. The engine
	/// retries this once internally; surfacing it means the retry also
	/// collided.
	#[error("Conflict: {0}")]
	Conflict(String),
	/// The actor role may not perform this non-transition operation.
	#[error("Role '{role}' may not {action}")]
	Forbidden { role: ActorRole, action: String },
	/// A checkout draft failed structural validation.
	#[error("Invalid order draft: {0}")]
	InvalidDraft(String),
	/// A shipment record was requested before the order became
	/// dispatch-eligible.
	#[error("Order '{order_id}' is not dispatch-eligible: status is {status}")]
	NotDispatchEligible { order_id: String, status: String },
	/// Failure in the persistence layer.
	#[error("Storage error: {0}")]
	Storage(String),
}

/// Maps engine rejections onto the API error surface. The message is the
/// engine's reason string, carried verbatim for console display.
impl From<EngineError> for APIError {
	fn from(e: EngineError) -> Self {
		let message = e.to_string();
		let bad_request = |error_type: &str, message: String| APIError::BadRequest {
			error_type: error_type.to_string(),
			message,
		};
		let conflict = |error_type: &str, message: String| APIError::Conflict {
			error_type: error_type.to_string(),
			message,
		};
		match e {
			EngineError::Transition(TransitionError::InvalidTransition { .. }) => {
				conflict("INVALID_TRANSITION", message)
			},
			EngineError::Transition(TransitionError::Unauthorized { .. })
			| EngineError::Forbidden { .. } => APIError::Forbidden {
				error_type: "UNAUTHORIZED".to_string(),
				message,
			},
			EngineError::Transition(TransitionError::MissingPayload { .. }) => {
				bad_request("MISSING_PAYLOAD", message)
			},
			EngineError::NotFound(_) => APIError::NotFound {
				error_type: "NOT_FOUND".to_string(),
				message,
			},
			EngineError::Conflict(_) => conflict("CONFLICT", message),
			EngineError::InvalidDraft(_) => bad_request("INVALID_DRAFT", message),
			EngineError::NotDispatchEligible { .. } => conflict("NOT_DISPATCH_ELIGIBLE", message),
			EngineError::Storage(_) => APIError::InternalServerError {
				error_type: "INTERNAL_ERROR".to_string(),
				message,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn api_mapping_preserves_reason_and_status() {
		let err = EngineError::Transition(TransitionError::MissingPayload {
			to: "DELIVERED".into(),
			field: "inspection_result".into(),
		});
		let api: APIError = err.into();
		assert_eq!(api.status_code(), 400);
		assert!(api.to_error_response().message.contains("inspection_result"));

		let api: APIError = EngineError::NotFound("order 'o-1'".into()).into();
		assert_eq!(api.status_code(), 404);

		let api: APIError = EngineError::Conflict("order 'o-1' changed concurrently".into()).into();
		assert_eq!(api.status_code(), 409);

		let api: APIError = EngineError::Forbidden {
			role: ActorRole::Vendor,
			action: "delete orders".into(),
		}
		.into();
		assert_eq!(api.status_code(), 403);
	}
}
