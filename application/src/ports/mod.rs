//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod agent_runtime;
pub mod credit_gate;
pub mod project_store;
pub mod turn_logger;
pub mod turn_progress;
