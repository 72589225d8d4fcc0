//! Infrastructure status reporting.
//!
//! # Data Flow
//! ```text
//! GET /api/resources/status
//!     → aggregator.rs (six concurrent sub-fetches)
//!         demo  → demo.rs (defaults + configured overrides)
//!         live  → inventory.rs (CloudInventory) → types.rs descriptors
//!     → failed sub-fetch: logged, counted, replaced by its default
//!     → InfrastructureStatus (counts derived on construction)
//! ```
//!
//! `progress.rs` holds the display-only connection and deployment
//! simulators; they never touch the inventory.

pub mod aggregator;
pub mod demo;
pub mod inventory;
pub mod progress;
pub mod types;

pub use aggregator::{HealthReport, InfrastructureAggregator, InfrastructureStatus, ResourceSnapshot};
pub use inventory::{
    CloudInventory, InventoryDocument, InventoryError, InventoryResult, SnapshotInventory,
    StaticInventory, UnavailableInventory,
};
pub use progress::{connection_status, deployment_progress, ConnectionState};
