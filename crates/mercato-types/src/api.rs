//! API types for the mercato HTTP surface.
//!
//! Request and response bodies exchanged with the admin, vendor and
//! delivery-staff consoles, plus the structured API error with its HTTP
//! status mapping. Rejection reasons are carried verbatim so the consoles
//! can display the specific reason, never a generic failure.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
	ActorRole, InstallmentStatus, OrderStatus, ShipmentStatus, TransitionPayload,
};

/// Body of POST /api/orders/{id}/status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTransitionRequest {
	/// Requested target status.
	pub target: OrderStatus,
	/// Already-resolved role of the acting user.
	pub role: ActorRole,
	#[serde(default)]
	pub payload: TransitionPayload,
}

/// Body of POST /api/orders/{id}/shipment/status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentTransitionRequest {
	pub target: ShipmentStatus,
	pub role: ActorRole,
	#[serde(default)]
	pub payload: TransitionPayload,
}

/// Body of POST /api/orders/{id}/agreement/status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementTransitionRequest {
	pub target: InstallmentStatus,
	pub role: ActorRole,
	#[serde(default)]
	pub payload: TransitionPayload,
}

/// Body of POST /api/orders/{id}/shipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShipmentRequest {
	pub role: ActorRole,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub carrier_shipment_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tracking_url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub carrier_notes: Option<String>,
}

/// Response of GET /api/orders/{id}/actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalActionsResponse {
	pub order_id: String,
	pub current: OrderStatus,
	/// Target statuses the given role may request from the current state.
	pub next: Vec<OrderStatus>,
}

/// API error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code.
	pub error: String,
	/// Human-readable description, shown verbatim in the consoles.
	pub message: String,
	/// Additional error context.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed or incomplete request (400).
	BadRequest { error_type: String, message: String },
	/// Actor role insufficient for the requested edge (403).
	Forbidden { error_type: String, message: String },
	/// Entity not found (404).
	NotFound { error_type: String, message: String },
	/// Illegal transition or concurrent modification (409).
	Conflict { error_type: String, message: String },
	/// Internal server error (500).
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::Forbidden { .. } => 403,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = match self {
			APIError::BadRequest { error_type, message }
			| APIError::Forbidden { error_type, message }
			| APIError::NotFound { error_type, message }
			| APIError::Conflict { error_type, message }
			| APIError::InternalServerError { error_type, message } => (error_type, message),
		};
		ErrorResponse {
			error: error_type.clone(),
			message: message.clone(),
			details: None,
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::Forbidden { message, .. } => write!(f, "Forbidden: {}", message),
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let error_response = self.to_error_response();
		(status, Json(error_response)).into_response()
	}
}
