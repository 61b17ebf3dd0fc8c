//! API endpoint implementations for the mercato HTTP surface.
//!
//! Each module holds the handlers for one resource. All handlers return
//! typed bodies from mercato-types and map engine rejections onto APIError,
//! so the consoles always receive the specific reason string.

pub mod agreement;
pub mod ledger;
pub mod order;
pub mod shipment;

use mercato_types::ActorRole;
use serde::Deserialize;

/// Query parameter carrying the caller's already-resolved role, used by the
/// read and delete endpoints that take no request body.
#[derive(Debug, Deserialize)]
pub struct RoleQuery {
	pub role: ActorRole,
}
