use crate::util::delta_objective;
use crate::util::Partition;
use mssc_core::scaled_delta;
use mssc_core::Instance;
use mssc_engine::Solver;

/// Initial-solution mode: how the search drives toward its first incumbent,
/// before `V.max` is ever finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialMode {
    /// Skip straight to main search — no dedicated warm-up phase.
    None,
    /// Smallest-domain-first variable choice, Δ-minimizing value choice.
    GreedyInit,
    /// Branch every observation onto the membership the instance provided.
    MembershipsAsIndicated,
}

/// Picks the next branching decision for the initial-solution phase, or
/// `None` once the mode defers to main search or there is nothing left to
/// branch on.
pub fn choose(mode: InitialMode, instance: &Instance, solver: &Solver) -> Option<(usize, usize)> {
    match mode {
        InitialMode::None => None,
        InitialMode::GreedyInit => greedy_init(instance, solver),
        InitialMode::MembershipsAsIndicated => memberships_as_indicated(instance, solver),
    }
}

/// Among the unfixed observations with the fewest remaining candidates,
/// picks the `(point, cluster)` pair with the smallest Δ-objective.
fn greedy_init(instance: &Instance, solver: &Solver) -> Option<(usize, usize)> {
    let min_size = (0..solver.n())
        .filter(|&i| !solver.is_fixed(i))
        .map(|i| solver.size(i))
        .min()?;
    let partition = Partition::build(instance, solver);
    let mut best: Option<(usize, usize, i64)> = None;
    for i in 0..solver.n() {
        if solver.is_fixed(i) || solver.size(i) != min_size {
            continue;
        }
        for c in solver.domain(i) {
            let delta = scaled_delta(delta_objective(instance, &partition, i, c));
            if best.is_none_or(|(_, _, best_delta)| delta < best_delta) {
                best = Some((i, c, delta));
            }
        }
    }
    best.map(|(i, c, _)| (i, c))
}

/// Branches the first unfixed observation onto its provided initial
/// membership.
fn memberships_as_indicated(instance: &Instance, solver: &Solver) -> Option<(usize, usize)> {
    let memberships = instance.memberships()?;
    (0..solver.n())
        .find(|&i| !solver.is_fixed(i))
        .map(|i| (i, memberships[i]))
}
