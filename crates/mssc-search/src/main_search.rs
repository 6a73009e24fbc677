use crate::util::delta_objective;
use crate::util::Partition;
use mssc_core::scaled_delta;
use mssc_core::Instance;
use mssc_engine::Solver;

/// Main search mode: once an incumbent exists, this is the driving
/// branching rule for the rest of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainMode {
    /// For every unfixed `i`, let `δ*(i)` be its smallest achievable
    /// Δ-objective over its domain; branch on the `i` maximizing `δ*(i)`.
    MaxMinVar,
}

/// Outcome of a main-search probe.
pub enum Decision {
    /// Branch on this `(observation, cluster)` pair.
    Branch(usize, usize),
    /// Every unfixed observation's best move is a zero Δ-objective tie —
    /// defer to the tie-breaking mode.
    Tie,
    /// Nothing left to branch on.
    Done,
}

/// MAX_MIN_VAR: picks the unfixed observation whose best achievable move
/// costs the most, so the search commits early to its hardest decisions.
/// A maximal `δ*` of exactly zero (every candidate equally free — true at
/// the very start, or whenever an empty cluster is still on the table)
/// falls through to tie-breaking instead of branching arbitrarily.
pub fn choose(_mode: MainMode, instance: &Instance, solver: &Solver) -> Decision {
    let unfixed: Vec<usize> = (0..solver.n()).filter(|&i| !solver.is_fixed(i)).collect();
    if unfixed.is_empty() {
        return Decision::Done;
    }
    let partition = Partition::build(instance, solver);

    let mut best: Option<(usize, usize, i64)> = None;
    for &i in &unfixed {
        let mut argmin: Option<(usize, i64)> = None;
        for c in solver.domain(i) {
            let delta = scaled_delta(delta_objective(instance, &partition, i, c));
            if argmin.is_none_or(|(_, d)| delta < d) {
                argmin = Some((c, delta));
            }
        }
        let (j, delta) = argmin.expect("i is unfixed, so its domain is nonempty");
        if best.is_none_or(|(_, _, best_delta)| delta > best_delta) {
            best = Some((i, j, delta));
        }
    }

    match best {
        Some((_, _, 0)) => Decision::Tie,
        Some((i, j, _)) => Decision::Branch(i, j),
        None => Decision::Done,
    }
}
