//! Credit gate port
//!
//! Consulted before every turn. Keeping it a port means the orchestrator
//! carries no billing logic; a deployment without metering plugs in
//! [`UnmeteredCredits`].

use async_trait::async_trait;
use bookwright_domain::ProjectId;
use thiserror::Error;

/// Errors from the credit gate.
#[derive(Error, Debug)]
pub enum CreditError {
    #[error("Insufficient credits: need {required}, have {available}")]
    Insufficient { required: u64, available: u64 },

    #[error("Credit gate error: {0}")]
    Gate(String),
}

/// Pre-turn credit check and post-turn usage recording.
#[async_trait]
pub trait CreditGate: Send + Sync {
    /// Check that `estimate` credits are available before a turn starts.
    /// Failing here leaves the project untouched except for its status.
    async fn reserve(&self, project: &ProjectId, estimate: u64) -> Result<(), CreditError>;

    /// Record actual usage after a turn completes.
    async fn commit(&self, project: &ProjectId, used: u64) -> Result<(), CreditError>;
}

/// Gate that always allows. For deployments without metering and for tests.
pub struct UnmeteredCredits;

#[async_trait]
impl CreditGate for UnmeteredCredits {
    async fn reserve(&self, _project: &ProjectId, _estimate: u64) -> Result<(), CreditError> {
        Ok(())
    }

    async fn commit(&self, _project: &ProjectId, _used: u64) -> Result<(), CreditError> {
        Ok(())
    }
}
