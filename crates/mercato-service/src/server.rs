//! HTTP server for the mercato status engine API.
//!
//! Exposes the engine's operations to the admin, vendor and delivery-staff
//! consoles under the /api base path. The server holds no state of its
//! own; every request is one engine call.

use axum::{
	routing::{get, post},
	Router,
};
use mercato_config::ApiConfig;
use mercato_core::StatusEngine;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::apis::{agreement, ledger, order, shipment};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the status engine for processing requests.
	pub engine: Arc<StatusEngine>,
}

/// Builds the API router. Separated from `start_server` so tests can drive
/// the router without binding a socket.
pub fn build_router(engine: Arc<StatusEngine>) -> Router {
	let app_state = AppState { engine };

	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", post(order::create))
				.route("/orders/{id}", get(order::get).delete(order::delete))
				.route("/orders/{id}/status", post(order::transition))
				.route("/orders/{id}/actions", get(order::actions))
				.route(
					"/orders/{id}/shipment",
					post(shipment::create).get(shipment::get),
				)
				.route("/orders/{id}/shipment/status", post(shipment::transition))
				.route("/orders/{id}/agreement", get(agreement::get))
				.route("/orders/{id}/agreement/status", post(agreement::transition))
				.route("/vendors/{id}/ledger", get(ledger::get)),
		)
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(app_state)
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<StatusEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = build_router(engine);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Mercato API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}
