//! Order endpoints: checkout, retrieval, status transitions, legal-action
//! queries and soft deletion.

use crate::apis::RoleQuery;
use crate::server::AppState;
use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::Json,
};
use mercato_types::{
	APIError, LegalActionsResponse, Order, OrderDraft, OrderStatus, OrderTransitionRequest,
};

/// Handles POST /api/orders: persists a Pending order from a checkout
/// draft.
pub async fn create(
	State(state): State<AppState>,
	Json(draft): Json<OrderDraft>,
) -> Result<(StatusCode, Json<Order>), APIError> {
	let order = state.engine.create_order(draft).await?;
	Ok((StatusCode::CREATED, Json(order)))
}

/// Handles GET /api/orders/{id}.
pub async fn get(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, APIError> {
	Ok(Json(state.engine.get_order(&id).await?))
}

/// Handles POST /api/orders/{id}/status: requests one order status
/// transition.
pub async fn transition(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<OrderTransitionRequest>,
) -> Result<Json<Order>, APIError> {
	let order = state
		.engine
		.request_order_transition(&id, request.target, request.role, &request.payload)
		.await?;
	Ok(Json(order))
}

/// Handles GET /api/orders/{id}/actions: the statuses the given role may
/// request from the order's current state.
pub async fn actions(
	Path(id): Path<String>,
	Query(query): Query<RoleQuery>,
	State(state): State<AppState>,
) -> Result<Json<LegalActionsResponse>, APIError> {
	let current: OrderStatus = state.engine.get_order(&id).await?.status;
	let next = state.engine.legal_next_states(&id, query.role).await?;
	Ok(Json(LegalActionsResponse {
		order_id: id,
		current,
		next,
	}))
}

/// Handles DELETE /api/orders/{id}: sets the soft-delete flag. Rows are
/// never physically removed.
pub async fn delete(
	Path(id): Path<String>,
	Query(query): Query<RoleQuery>,
	State(state): State<AppState>,
) -> Result<Json<Order>, APIError> {
	Ok(Json(state.engine.soft_delete_order(&id, query.role).await?))
}
