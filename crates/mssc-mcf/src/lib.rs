//! Reference minimum-cost flow solver backing the W-FLOW bound.
//!
//! Provides a small directed flow [`Network`] (petgraph-backed, forward
//! arcs paired with zero-capacity residual twins), a Bellman-Ford
//! residual-cost shortest-path routine that supports node exclusion (used
//! directly by W-FLOW's residual-graph cost reasoning, not just by the
//! solver internally), and a [`FlowSolver`] that runs successive shortest
//! augmenting paths to find a minimum-cost flow of a required size.
#![allow(dead_code)]

mod network;
mod path;
mod solver;

pub use network::Arc;
pub use network::Network;
pub use path::bellman_ford;
pub use path::ShortestPaths;
pub use solver::Coupling;
pub use solver::FlowError;
pub use solver::FlowSolver;
