//! Project aggregate: the persisted state of one book generation effort.

pub mod chapter;
pub mod entities;
