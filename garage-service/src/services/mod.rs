//! Services module for garage-service.

pub mod catalog;
pub mod database;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod listing;
pub mod memory;
pub mod metrics;
pub mod pricing;
pub mod registry;
pub mod store;
pub mod validation;

pub use database::Database;
pub use engine::{DocumentEngine, DocumentUpdate};
pub use error::DocumentError;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use store::{Store, UnitOfWork};
