//! Core status engine for the mercato system.
//!
//! This crate holds the one piece of the platform with real state-transition
//! semantics: the transition tables for the three coupled status dimensions
//! of a purchase record (order fulfillment, carrier shipment, installment
//! approval), the pure validator over them, the side-effect dispatcher for
//! notifications and vendor ledger credits, and the StatusEngine that
//! orchestrates load-validate-commit-dispatch with optimistic concurrency.

/// Builder pattern for constructing engines from pluggable implementations.
pub mod builder;
/// Side-effect dispatcher: notifications and ledger credits.
pub mod dispatcher;
/// The status engine orchestrator.
pub mod engine;
/// Error taxonomy for transitions and engine operations.
pub mod error;
/// The authoritative transition tables.
pub mod table;
/// The pure transition validator.
pub mod validator;

pub use builder::{BuilderError, EngineBuilder, EngineFactories};
pub use dispatcher::SideEffectDispatcher;
pub use engine::StatusEngine;
pub use error::{EngineError, TransitionError};
pub use table::{agreement_table, order_table, shipment_table, EdgeRule, TransitionTable};
pub use validator::validate;

pub use mercato_ledger::{LedgerEntry, LedgerError, LedgerService};
pub use mercato_notification::{NotificationError, NotificationService};
pub use mercato_storage::{StorageError, StorageService};
