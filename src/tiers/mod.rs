//! Tier routing module
//!
//! Maps service tiers to provider/model pairs and routes requests along
//! each tier's fallback chain.

pub mod catalog;
pub mod config;
pub mod router;
pub mod types;

pub use catalog::{ModelCatalog, ModelSpec};
pub use config::{RoutingTable, TierConfig};
pub use router::{AttemptRecord, ModelRouter, RoutedCompletion};
pub use types::{ModelRef, Provider, Tier};
