//! Common types for the mercato status engine.
//!
//! This crate defines the core data types shared by every component of the
//! system: status enumerations, purchase records, actor roles, transition
//! payloads, notification templates and the configuration validation
//! framework. Keeping them in one place keeps the infrastructure crates
//! decoupled from each other.

/// Actor roles and the delivery inspection result.
pub mod actor;
/// Installment agreement record.
pub mod agreement;
/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Notification recipients and template kinds.
pub mod notification;
/// Order and line item records.
pub mod order;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Carrier shipment record.
pub mod shipment;
/// Status enumerations for the three lifecycle dimensions.
pub mod status;
/// Storage namespace keys.
pub mod storage;
/// Auxiliary transition data required by certain edges.
pub mod transition;
/// Small shared helpers.
pub mod utils;
/// Configuration validation framework for TOML sections.
pub mod validation;

pub use actor::*;
pub use agreement::*;
pub use api::*;
pub use notification::*;
pub use order::*;
pub use registry::*;
pub use shipment::*;
pub use status::*;
pub use storage::*;
pub use transition::*;
pub use utils::{now_secs, truncate_id};
pub use validation::*;
