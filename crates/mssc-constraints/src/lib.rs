//! Global constraints for the cardinality-constrained MSSC solver.
//!
//! Exposes the value-precedence symmetry breaker (VPB), the shared
//! dissimilarity-sum bookkeeping every WCSS bound rebuilds each
//! propagation, and the three WCSS lower-bound constraints in increasing
//! order of strength and cost: W-GEN (no cardinality control), W-CARD
//! (internal cardinality control), W-FLOW (min-cost flow).
#![allow(dead_code)]

mod bookkeeping;
mod vpb;
mod wcard;
mod wflow;
mod wgen;

pub use bookkeeping::nb_add;
pub use bookkeeping::saturate_cardinalities;
pub use bookkeeping::Bookkeeping;
pub use vpb::Vpb;
pub use wcard::WCard;
pub use wflow::WFlow;
pub use wgen::WGen;
