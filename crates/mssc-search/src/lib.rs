//! Binary-branching search strategy for the cardinality-constrained MSSC
//! solver: initial-solution, main-search, and tie-breaking modes, sharing
//! Δ-objective and centroid utilities, wired into a single
//! [`mssc_engine::Brancher`] state machine.
#![allow(dead_code)]

mod initial;
mod main_search;
mod tie;
mod util;

pub use initial::InitialMode;
pub use main_search::MainMode;
pub use tie::TieMode;
pub use util::centroid;
pub use util::delta_objective;
pub use util::squared_distance;
pub use util::Partition;

use mssc_core::Instance;
use mssc_engine::Branch;
use mssc_engine::Brancher;
use mssc_engine::Solver;

/// Which initial/main/tie heuristics to run, bundled the way
/// `mssc-core::SolverConfig` exposes them to the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyConfig {
    pub initial: InitialMode,
    pub main: MainMode,
    pub tie: TieMode,
}

impl Default for StrategyConfig {
    /// `GREEDY_INIT` then `MAX_MIN_VAR`, breaking ties with the centroid
    /// heuristic when coordinates are available — a reasonable default for
    /// an instance that carries both `D` and `coords`.
    fn default() -> Self {
        Self {
            initial: InitialMode::GreedyInit,
            main: MainMode::MaxMinVar,
            tie: TieMode::FarthestPointFromBiggestCenter,
        }
    }
}

/// One recorded branching decision, for post-hoc inspection of a search
/// trace. Purely a diagnostics hook — it changes no branching decision.
#[derive(Debug, Clone, Copy)]
pub struct BranchRecord {
    pub node: usize,
    pub var: usize,
    pub val: usize,
    pub phase: Phase,
}

/// Which of the three modes produced a [`BranchRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initial,
    Main,
    Tie,
}

/// Append-only trace of every branching decision taken during a search.
/// Purely observational: nothing in [`Strategy`] reads it back to decide a
/// future branch.
#[derive(Debug, Default)]
pub struct SearchLog {
    records: Vec<BranchRecord>,
}

impl SearchLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[BranchRecord] {
        &self.records
    }

    fn push(&mut self, node: usize, var: usize, val: usize, phase: Phase) {
        self.records.push(BranchRecord { node, var, val, phase });
    }
}

/// Tries the initial-solution mode until an incumbent exists, then main
/// search, falling through to tie-breaking whenever main search reports a
/// δ* = 0 tie.
pub struct Strategy<'a> {
    instance: &'a Instance,
    config: StrategyConfig,
    log: Option<&'a mut SearchLog>,
    last_tie: Option<(usize, usize)>,
}

impl<'a> Strategy<'a> {
    pub fn new(instance: &'a Instance, config: StrategyConfig) -> Self {
        Self {
            instance,
            config,
            log: None,
            last_tie: None,
        }
    }

    pub fn with_log(mut self, log: &'a mut SearchLog) -> Self {
        self.log = Some(log);
        self
    }

    fn record(&mut self, node: usize, var: usize, val: usize, phase: Phase) {
        if let Some(log) = self.log.as_deref_mut() {
            log.push(node, var, val, phase);
        }
    }

    /// Deterministic last resort when tie-breaking itself has nothing to
    /// propose (no tie mode configured and no previous decision on record,
    /// e.g. the very first node of a coordinate-free instance): the first
    /// unfixed observation's smallest remaining candidate value. Never
    /// unsound — it is still just one half of a binary choice the engine
    /// explores both sides of.
    fn first_free(solver: &Solver) -> Option<(usize, usize)> {
        for i in 0..solver.n() {
            if !solver.is_fixed(i) {
                let domain = solver.domain(i);
                return domain.first().map(|&c| (i, c));
            }
        }
        None
    }
}

impl Brancher for Strategy<'_> {
    fn branch(&mut self, solver: &Solver) -> Option<Branch> {
        let node = solver.nodes();
        let solution_found = solver.v_max().is_finite();

        if !solution_found && self.config.initial != InitialMode::None {
            if let Some((i, c)) = initial::choose(self.config.initial, self.instance, solver) {
                self.record(node, i, c, Phase::Initial);
                return Some(Branch { var: i, val: c });
            }
        }

        match main_search::choose(self.config.main, self.instance, solver) {
            main_search::Decision::Branch(i, c) => {
                self.record(node, i, c, Phase::Main);
                Some(Branch { var: i, val: c })
            }
            main_search::Decision::Tie => {
                let chosen = tie::choose(self.config.tie, self.instance, solver, self.last_tie)
                    .or_else(|| Self::first_free(solver));
                self.last_tie = chosen;
                chosen.map(|(i, c)| {
                    self.record(node, i, c, Phase::Tie);
                    Branch { var: i, val: c }
                })
            }
            main_search::Decision::Done => None,
        }
    }
}
