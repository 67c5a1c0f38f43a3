//! Tool registry types: capabilities, definitions, per-turn tool sets, and
//! tool calls emitted by the agent runtime.

pub mod entities;
