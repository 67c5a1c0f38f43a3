//! Local credit ledger.
//!
//! Per-project balances held in process memory. Stands in for a real billing
//! service behind the same port; reserve checks the balance, commit deducts
//! it. Projects not seen before start at the configured initial balance.

use async_trait::async_trait;
use bookwright_application::ports::credit_gate::{CreditError, CreditGate};
use bookwright_domain::ProjectId;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Credit gate backed by local per-project balances.
pub struct LocalCreditLedger {
    initial_balance: u64,
    balances: Mutex<HashMap<String, u64>>,
}

impl LocalCreditLedger {
    pub fn new(initial_balance: u64) -> Self {
        Self {
            initial_balance,
            balances: Mutex::new(HashMap::new()),
        }
    }

    pub fn balance(&self, project: &ProjectId) -> u64 {
        self.balances
            .lock()
            .map(|b| b.get(project.as_str()).copied().unwrap_or(self.initial_balance))
            .unwrap_or(0)
    }

    pub fn top_up(&self, project: &ProjectId, amount: u64) {
        if let Ok(mut balances) = self.balances.lock() {
            let balance = balances
                .entry(project.to_string())
                .or_insert(self.initial_balance);
            *balance = balance.saturating_add(amount);
        }
    }
}

#[async_trait]
impl CreditGate for LocalCreditLedger {
    async fn reserve(&self, project: &ProjectId, estimate: u64) -> Result<(), CreditError> {
        let mut balances = self
            .balances
            .lock()
            .map_err(|_| CreditError::Gate("ledger lock poisoned".to_string()))?;
        let balance = *balances
            .entry(project.to_string())
            .or_insert(self.initial_balance);
        if balance < estimate {
            return Err(CreditError::Insufficient {
                required: estimate,
                available: balance,
            });
        }
        debug!(project = %project, estimate, available = balance, "credits reserved");
        Ok(())
    }

    async fn commit(&self, project: &ProjectId, used: u64) -> Result<(), CreditError> {
        let mut balances = self
            .balances
            .lock()
            .map_err(|_| CreditError::Gate("ledger lock poisoned".to_string()))?;
        let balance = balances
            .entry(project.to_string())
            .or_insert(self.initial_balance);
        *balance = balance.saturating_sub(used);
        debug!(project = %project, used, remaining = *balance, "credits committed");
        Ok(())
    }
}
