//! Shipment endpoints: carrier record creation, retrieval and status
//! relay from the admin console.

use crate::server::AppState;
use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use mercato_types::{APIError, CreateShipmentRequest, ShipmentRecord, ShipmentTransitionRequest};

/// Handles POST /api/orders/{id}/shipment: creates the carrier record for
/// a dispatch-eligible order.
pub async fn create(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<CreateShipmentRequest>,
) -> Result<(StatusCode, Json<ShipmentRecord>), APIError> {
	let shipment = state
		.engine
		.create_shipment(
			&id,
			request.role,
			request.carrier_shipment_id,
			request.tracking_url,
			request.carrier_notes,
		)
		.await?;
	Ok((StatusCode::CREATED, Json(shipment)))
}

/// Handles GET /api/orders/{id}/shipment.
pub async fn get(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<ShipmentRecord>, APIError> {
	Ok(Json(state.engine.get_shipment(&id).await?))
}

/// Handles POST /api/orders/{id}/shipment/status: applies one carrier
/// status update, attaching any tracking metadata in the payload.
pub async fn transition(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<ShipmentTransitionRequest>,
) -> Result<Json<ShipmentRecord>, APIError> {
	let shipment = state
		.engine
		.request_shipment_transition(&id, request.target, request.role, &request.payload)
		.await?;
	Ok(Json(shipment))
}
