//! Command-line front end for the exact cardinality-constrained MSSC solver.
//!
//! Loads an instance from a JSON file, posts the requested WCSS bound and
//! search heuristics, runs the branch-and-bound search to completion, and
//! reports the optimal assignment, objective value, and node count.

use anyhow::Context;
use clap::Parser;
use clap::ValueEnum;
use mssc::solve;
use mssc::BoundMode;
use mssc::SolverConfig;
use mssc_core::Dissimilarity;
use mssc_core::Instance;
use mssc_search::InitialMode;
use mssc_search::MainMode;
use mssc_search::StrategyConfig;
use mssc_search::TieMode;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mssc", about = "Exact cardinality-constrained MSSC solver")]
struct Cli {
    /// Path to a JSON instance file (see `InstanceFile` for the schema).
    instance: PathBuf,

    /// Which WCSS lower-bound constraint to post.
    #[arg(long, value_enum, default_value = "flow")]
    bound: CliBound,

    /// Initial-solution mode.
    #[arg(long, value_enum, default_value = "greedy-init")]
    initial: CliInitial,

    /// Tie-breaking heuristic (ignored unless the instance carries coords
    /// for the centroid-based modes).
    #[arg(long, value_enum, default_value = "farthest-point-from-biggest-center")]
    tie: CliTie,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliBound {
    Gen,
    Card,
    Flow,
}

impl From<CliBound> for BoundMode {
    fn from(b: CliBound) -> Self {
        match b {
            CliBound::Gen => BoundMode::Gen,
            CliBound::Card => BoundMode::Card,
            CliBound::Flow => BoundMode::Flow,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliInitial {
    None,
    GreedyInit,
    MembershipsAsIndicated,
}

impl From<CliInitial> for InitialMode {
    fn from(m: CliInitial) -> Self {
        match m {
            CliInitial::None => InitialMode::None,
            CliInitial::GreedyInit => InitialMode::GreedyInit,
            CliInitial::MembershipsAsIndicated => InitialMode::MembershipsAsIndicated,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliTie {
    None,
    UnboundFarthestTotalSs,
    FixedFarthestDist,
    FixedMaxMin,
    FarthestPointFromBiggestCenter,
    MaxMinPointFromAllCenters,
}

impl From<CliTie> for TieMode {
    fn from(m: CliTie) -> Self {
        match m {
            CliTie::None => TieMode::None,
            CliTie::UnboundFarthestTotalSs => TieMode::UnboundFarthestTotalSs,
            CliTie::FixedFarthestDist => TieMode::FixedFarthestDist,
            CliTie::FixedMaxMin => TieMode::FixedMaxMin,
            CliTie::FarthestPointFromBiggestCenter => TieMode::FarthestPointFromBiggestCenter,
            CliTie::MaxMinPointFromAllCenters => TieMode::MaxMinPointFromAllCenters,
        }
    }
}

/// On-disk instance schema: a dense dissimilarity matrix plus the optional
/// coordinate matrix, target cardinalities, and initial memberships.
#[derive(Deserialize)]
struct InstanceFile {
    k: usize,
    dissimilarity: Vec<Vec<f64>>,
    #[serde(default)]
    coords: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    target: Option<Vec<usize>>,
    #[serde(default)]
    memberships: Option<Vec<usize>>,
}

fn load_instance(path: &PathBuf) -> anyhow::Result<Instance> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading instance file {}", path.display()))?;
    let file: InstanceFile =
        serde_json::from_str(&text).with_context(|| format!("parsing instance file {}", path.display()))?;
    let dissimilarity = Dissimilarity::from_rows(file.dissimilarity);
    Instance::new(file.k, dissimilarity, file.coords, file.target, file.memberships)
        .context("instance failed validation")
}

fn main() -> anyhow::Result<()> {
    mssc_core::log();
    let cli = Cli::parse();

    let instance = load_instance(&cli.instance)?;
    log::info!(
        "loaded instance: n={} k={} coords={} target={}",
        instance.n(),
        instance.k(),
        instance.has_coords(),
        instance.targets().is_some()
    );

    let config = SolverConfig {
        bound: cli.bound.into(),
        strategy: StrategyConfig {
            initial: cli.initial.into(),
            main: MainMode::MaxMinVar,
            tie: cli.tie.into(),
        },
    };

    let solution = solve(instance, config).context("instance is infeasible: no assignment satisfies the target cardinalities")?;

    log::info!("search visited {} nodes", solution.nodes);
    println!("objective: {}", solution.objective);
    println!("assignment: {:?}", solution.assignment);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_well_formed_instance_file() {
        let file: InstanceFile = serde_json::from_str(
            r#"{
                "k": 2,
                "dissimilarity": [[0,1,9,9],[1,0,9,9],[9,9,0,1],[9,9,1,0]],
                "target": [2,2]
            }"#,
        )
        .unwrap();
        let instance = Instance::new(
            file.k,
            Dissimilarity::from_rows(file.dissimilarity),
            file.coords,
            file.target,
            file.memberships,
        )
        .unwrap();
        assert_eq!(instance.n(), 4);
        assert_eq!(instance.targets(), Some(&[2usize, 2][..]));
    }
}
