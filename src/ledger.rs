// Thin re-export module: implementation lives in `ledger/chain.rs` so the
// data model can later be decomposed (validation, rendering) without moving
// the public path.

pub mod chain;
pub use chain::*;
