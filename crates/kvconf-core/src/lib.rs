//! kvconf Core - Versioned configurations and groups on a prefix-ordered KV store
//!
//! This crate provides:
//! - Key codec: how coordinates map onto flat backend keys
//! - Idempotency ledger: at-most-once creates keyed by a client token
//! - Configuration and group repositories
//! - `OpContext`: per-operation deadline propagated to every backend call

pub mod config_repo;
pub mod context;
pub mod group_repo;
pub mod key;
pub mod ledger;
pub mod model;

mod scan;

pub use config_repo::ConfigRepository;
pub use context::OpContext;
pub use group_repo::GroupRepository;
pub use ledger::IdempotencyLedger;
pub use model::{Configuration, DeleteSummary, DetachOutcome, Group};
