//! Installment agreement endpoints: retrieval and the admin approval
//! workflow.

use crate::server::AppState;
use axum::{
	extract::{Path, State},
	response::Json,
};
use mercato_types::{APIError, AgreementTransitionRequest, InstallmentAgreement};

/// Handles GET /api/orders/{id}/agreement.
pub async fn get(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<InstallmentAgreement>, APIError> {
	Ok(Json(state.engine.get_agreement(&id).await?))
}

/// Handles POST /api/orders/{id}/agreement/status: applies one approval
/// workflow transition. Rejection requires a non-empty reason in the
/// payload; approval requires none.
pub async fn transition(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<AgreementTransitionRequest>,
) -> Result<Json<InstallmentAgreement>, APIError> {
	let agreement = state
		.engine
		.request_agreement_transition(&id, request.target, request.role, &request.payload)
		.await?;
	Ok(Json(agreement))
}
