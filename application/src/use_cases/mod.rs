//! Use cases (application services)

pub mod approval_gate;
pub mod commit;
pub mod resume;
pub mod run_turn;
pub mod status;

#[cfg(test)]
pub(crate) mod test_support;
