//! Batch preparation and broadcast
//!
//! A batch moves USDC along several [`Relation`]s at once. [`BatchBridge`]
//! prepares them one by one against the signing device, then broadcasts the
//! signed transactions concurrently and returns a [`BatchReport`] with one
//! outcome per relation.

mod bridge;
mod config;
mod relation;
mod report;
mod reservations;

pub use bridge::BatchBridge;
pub use config::{BatchConfig, GasConfig, PollingConfig};
pub use relation::Relation;
pub use report::{
    BatchReport, FailureStage, PreparedBatch, PreparedRelation, RelationOutcome, RelationStatus,
};
