//! Credit gate adapters

pub mod ledger;

pub use ledger::LocalCreditLedger;
