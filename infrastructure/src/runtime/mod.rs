//! Agent runtime adapters

pub mod http;

pub use http::HttpAgentRuntime;
