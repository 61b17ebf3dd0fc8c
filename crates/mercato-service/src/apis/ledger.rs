//! Vendor ledger endpoints, read-only. Settled commission credits are
//! written exclusively by the engine's side-effect dispatcher.

use crate::server::AppState;
use axum::{
	extract::{Path, State},
	response::Json,
};
use mercato_ledger::LedgerEntry;
use mercato_types::APIError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response of GET /api/vendors/{id}/ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorLedgerResponse {
	pub vendor_id: String,
	/// Sum of all settled credits.
	pub balance: Decimal,
	/// Individual credits in settlement order.
	pub entries: Vec<LedgerEntry>,
}

/// Handles GET /api/vendors/{id}/ledger: the vendor console's view of its
/// settled commission credits.
pub async fn get(
	Path(vendor_id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<VendorLedgerResponse>, APIError> {
	let ledger = state.engine.ledger();
	let balance = ledger
		.balance(&vendor_id)
		.await
		.map_err(|e| APIError::InternalServerError {
			error_type: "INTERNAL_ERROR".to_string(),
			message: e.to_string(),
		})?;
	let entries = ledger
		.entries(&vendor_id)
		.await
		.map_err(|e| APIError::InternalServerError {
			error_type: "INTERNAL_ERROR".to_string(),
			message: e.to_string(),
		})?;
	Ok(Json(VendorLedgerResponse {
		vendor_id,
		balance,
		entries,
	}))
}
