//! shinsa-store — Data gateway implementations.
//!
//! Implements the `DataGateway` trait over a JSON file and over memory,
//! and loads the configuration that chooses between them.

mod apply;
pub mod config;
pub mod json;
pub mod memory;

pub use config::{create_gateway, load_config_from, ShinsaConfig, StoreConfig};
pub use json::JsonFileGateway;
pub use memory::{MemoryGateway, Operation};
