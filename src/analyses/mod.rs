//! Derived, lazily recomputed analyses over a [`crate::graph::Graph`]:
//! def-use outs, dominance, and loop info.

pub mod dominance;
pub mod loop_info;
pub mod outs;

pub use dominance::DominanceInfo;
pub use loop_info::LoopInfo;
