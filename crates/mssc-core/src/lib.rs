//! Instance data, shared type aliases, and tuning constants for the
//! cardinality-constrained MSSC solver.
//!
//! This crate provides the foundational types used throughout the
//! `mssc-*` workspace: the immutable problem instance, the numeric
//! aliases the propagators and search strategy share, and the
//! implementation-defined tuning constants (epsilon guards, integer
//! scaling factors).
#![allow(dead_code)]

mod instance;

pub use instance::*;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Pairwise dissimilarities, WCSS bounds, and the objective variable V.
pub type Weight = f64;
/// Coordinates in the optional centroid space (only used by tie-breakers).
pub type Coord = f64;
/// Cluster or observation index.
pub type Index = usize;

// ============================================================================
// NUMERICAL CONSTANTS
// ============================================================================
/// Lower-bound tightening guard for W-GEN and W-CARD: `V.min = lb - EPS`.
/// Compensates for floating-point underestimation without ever causing a
/// missed prune (we underestimate `lb`, so a small guard can only make the
/// bound more conservative, never unsound).
pub const EPS_GEN_CARD: Weight = 5e-5;
/// Lower-bound tightening guard for W-FLOW (looser: the MCF objective has
/// more accumulated floating-point error than the closed-form DP bounds).
pub const EPS_FLOW: Weight = 5e-3;
/// Integer scaling factor for Δ-objective comparisons in the search
/// strategy, so that tie detection (`δ* == 0`) is an exact integer
/// comparison rather than a floating-point equality.
pub const DELTA_SCALE: i64 = 1000;
/// Integer scaling factor for total-sum-of-squares comparisons used by the
/// `UNBOUND_FARTHEST_TOTAL_SS` tie-breaker.
pub const SS_SCALE: i64 = 100;

/// Scales a floating-point Δ-objective value into the exact-comparison
/// integer domain used by the search strategy.
pub fn scaled_delta(x: Weight) -> i64 {
    (x * DELTA_SCALE as Weight).round() as i64
}
/// Scales a floating-point sum-of-squares value for exact tie comparisons.
pub fn scaled_ss(x: Weight) -> i64 {
    (x * SS_SCALE as Weight).round() as i64
}

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initializes dual logging (terminal + file) with a timestamped log file.
/// Creates a `logs/` directory and writes DEBUG level to file, INFO to
/// terminal.
#[cfg(feature = "cli")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves forward")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
