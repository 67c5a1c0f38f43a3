//! Infrastructure layer for bookwright
//!
//! Adapters for the application layer's ports: JSON file and in-memory
//! project stores, the HTTP agent runtime, a local credit ledger, a JSONL
//! turn logger, and configuration loading.

pub mod config;
pub mod credit;
pub mod logging;
pub mod runtime;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use credit::LocalCreditLedger;
pub use logging::JsonlTurnLogger;
pub use runtime::HttpAgentRuntime;
pub use store::{JsonFileStore, MemoryStore};
