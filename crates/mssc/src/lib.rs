//! Facade crate: wires the engine, the three WCSS lower-bound constraints,
//! the value-precedence symmetry breaker, and the search strategy into a
//! single `solve()` entry point: post the chosen constraints, start search.
#![allow(dead_code)]

use mssc_constraints::Bookkeeping;
use mssc_constraints::Vpb;
use mssc_constraints::WCard;
use mssc_constraints::WFlow;
use mssc_constraints::WGen;
use mssc_core::Instance;
use mssc_core::Weight;
use mssc_engine::search;
use mssc_engine::Propagator;
use mssc_engine::Solver;
use mssc_search::SearchLog;
use mssc_search::Strategy;
use mssc_search::StrategyConfig;
use std::rc::Rc;

/// Which WCSS lower-bound constraint to post, in increasing order of
/// strength and cost. `Card` and `Flow` require the instance to carry
/// target cardinalities; `solve` falls back to `Gen` automatically when it
/// doesn't.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundMode {
    /// W-GEN: no cardinality control, works on any instance.
    Gen,
    /// W-CARD: exploits fixed target cardinalities.
    Card,
    /// W-FLOW: min-cost-flow bound, the strongest of the three.
    Flow,
}

/// Everything `solve` needs beyond the instance itself: which bound to
/// post and which search heuristics to run.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    pub bound: BoundMode,
    pub strategy: StrategyConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            bound: BoundMode::Flow,
            strategy: StrategyConfig::default(),
        }
    }
}

/// The solve outcome: the optimal assignment, its objective value, and how
/// many search nodes were visited (useful for comparing how much a
/// stronger bound prunes relative to a weaker one).
#[derive(Debug, Clone)]
pub struct Solution {
    pub assignment: Vec<usize>,
    pub objective: Weight,
    pub nodes: usize,
}

/// `V = Σ_c (1/|Cᶜ|) Σ_{i<j ∈ Cᶜ} D[i][j]` for the solver's current (fully
/// fixed) assignment.
pub fn objective(instance: &Instance, solver: &Solver) -> Weight {
    let bk = Bookkeeping::build(instance, solver, 0);
    bk.s1
        .iter()
        .zip(&bk.size_cluster)
        .map(|(&s1, &size)| if size > 0 { s1 / size as Weight } else { 0.0 })
        .sum()
}

fn propagators(instance: &Rc<Instance>, solver: &Solver, bound: BoundMode) -> Vec<Box<dyn Propagator>> {
    let k = instance.k();
    let mut props: Vec<Box<dyn Propagator>> = Vec::new();

    // Value-precedence chain 0<1<2<...<K-1: breaks the full symmetry group
    // over cluster labels, not just one pair.
    for s in 0..k.saturating_sub(1) {
        props.push(Box::new(Vpb::new(solver, s, s + 1)));
    }

    // W-GEN ignores cardinalities entirely by design: posting it alone
    // against a target-bearing instance would silently solve the
    // *unconstrained* MSSC problem instead, since nothing else here
    // enforces |C_c| = target[c]. Gen only ever applies when there is no
    // target to violate; W-CARD/W-FLOW fold cardinality enforcement into
    // their own propagation (`saturate_cardinalities`, `nb_add[c] >= 0`),
    // so either is always safe once a target vector exists.
    let bound = match (instance.targets().is_some(), bound) {
        (false, _) => BoundMode::Gen,
        (true, BoundMode::Gen) => {
            log::warn!("W-GEN ignores target cardinalities; using W-FLOW instead");
            BoundMode::Flow
        }
        (true, chosen) => chosen,
    };
    match bound {
        BoundMode::Gen => props.push(Box::new(WGen::new(Rc::clone(instance)))),
        BoundMode::Card => props.push(Box::new(WCard::new(Rc::clone(instance)))),
        BoundMode::Flow => props.push(Box::new(WFlow::new(Rc::clone(instance)))),
    }
    props
}

/// Runs the exact branch-and-bound search end to end: posts the
/// value-precedence chain and the chosen WCSS bound, then explores the
/// whole tree under [`mssc_search::Strategy`], returning the best (optimal,
/// since every leaf not pruned by a sound bound is visited) solution
/// found. Returns `None` if the instance is infeasible (e.g. target
/// cardinalities cannot be met).
pub fn solve(instance: Instance, config: SolverConfig) -> Option<Solution> {
    solve_logged(instance, config, None)
}

/// As [`solve`], but also records every branching decision into `log` for
/// post-hoc inspection.
pub fn solve_logged(instance: Instance, config: SolverConfig, log: Option<&mut SearchLog>) -> Option<Solution> {
    let n = instance.n();
    let k = instance.k();
    let instance = Rc::new(instance);

    let mut solver = Solver::new(n, k);
    let mut props = propagators(&instance, &solver, config.bound);

    let mut strategy = Strategy::new(&instance, config.strategy);
    let mut strategy = match log {
        Some(log) => strategy.with_log(log),
        None => strategy,
    };

    let mut best: Option<(Vec<usize>, Weight)> = None;
    search(&mut solver, &mut props, &mut strategy, &mut |s| {
        let value = objective(&instance, s);
        s.record_incumbent(value);
        if best.as_ref().is_none_or(|(_, v)| value < *v) {
            let assignment = (0..s.n()).map(|i| s.value(i).expect("leaf is fully fixed")).collect();
            best = Some((assignment, value));
        }
    });

    let nodes = solver.nodes();
    best.map(|(assignment, objective)| Solution {
        assignment,
        objective,
        nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mssc_core::Dissimilarity;
    use mssc_search::InitialMode;
    use mssc_search::MainMode;
    use mssc_search::TieMode;
    use rand::rngs::SmallRng;
    use rand::Rng;
    use rand::SeedableRng;

    /// Exhaustive enumeration of every cardinality-respecting labeling,
    /// returning the minimum objective. Used only by tests, never by
    /// `solve` itself.
    fn brute_force(instance: &Instance) -> Weight {
        let n = instance.n();
        let k = instance.k();
        let mut labels = vec![0usize; n];
        let mut best = Weight::INFINITY;
        enumerate(instance, &mut labels, 0, k, &mut best);
        best
    }

    fn enumerate(instance: &Instance, labels: &mut [usize], i: usize, k: usize, best: &mut Weight) {
        if i == labels.len() {
            if let Some(targets) = instance.targets() {
                let mut counts = vec![0usize; k];
                for &c in labels.iter() {
                    counts[c] += 1;
                }
                if counts != targets {
                    return;
                }
            }
            let mut solver = Solver::new(labels.len(), k);
            for (idx, &c) in labels.iter().enumerate() {
                solver.assign(idx, c).expect("brute-force labels are always assignable on a fresh solver");
            }
            let v = objective(instance, &solver);
            if v < *best {
                *best = v;
            }
            return;
        }
        for c in 0..k {
            labels[i] = c;
            enumerate(instance, labels, i + 1, k, best);
        }
    }

    fn seed_instance_1() -> Instance {
        let d = Dissimilarity::from_rows(vec![
            vec![0.0, 1.0, 9.0, 9.0],
            vec![1.0, 0.0, 9.0, 9.0],
            vec![9.0, 9.0, 0.0, 1.0],
            vec![9.0, 9.0, 1.0, 0.0],
        ]);
        Instance::new(2, d, None, Some(vec![2, 2]), None).unwrap()
    }

    /// Two well-separated pairs, optimal V = 1.
    #[test]
    fn seed_test_1_two_pairs() {
        let instance = seed_instance_1();
        let solution = solve(instance, SolverConfig::default()).unwrap();
        assert!((solution.objective - 1.0).abs() < 1e-3);
        let mut clusters = [vec![], vec![]];
        for (i, &c) in solution.assignment.iter().enumerate() {
            clusters[c].push(i);
        }
        clusters.iter_mut().for_each(|c| c.sort());
        clusters.sort();
        assert_eq!(clusters, [vec![0, 1], vec![2, 3]]);
    }

    /// Three well-separated pairs (each pair the
    /// "vertices" of its own tight little cluster), target=(2,2,2). Every
    /// cluster contributes the same intra-pair distance, so the optimum
    /// (and, on this clean a split, the W-FLOW bound at the root) is
    /// exactly `3 * pair_distance / 2`.
    #[test]
    fn seed_test_2_three_separated_pairs() {
        const PAIR: f64 = 2.0;
        const FAR: f64 = 100.0;
        let pairs = [(0, 1), (2, 3), (4, 5)];
        let mut rows = vec![vec![FAR; 6]; 6];
        for i in 0..6 {
            rows[i][i] = 0.0;
        }
        for &(a, b) in &pairs {
            rows[a][b] = PAIR;
            rows[b][a] = PAIR;
        }
        let d = Dissimilarity::from_rows(rows);
        let instance = Instance::new(3, d, None, Some(vec![2, 2, 2]), None).unwrap();
        let solution = solve(
            instance,
            SolverConfig {
                bound: BoundMode::Flow,
                strategy: StrategyConfig::default(),
            },
        )
        .unwrap();
        assert!((solution.objective - 3.0 * PAIR / 2.0).abs() < 1e-3);
    }

    /// The W-FLOW bound on the fully unassigned root node of the same
    /// instance is exactly tight (no search needed to reach the true
    /// optimum), because the transportation problem decomposes cleanly
    /// into three independent pairs.
    #[test]
    fn seed_test_2_w_flow_bound_is_tight_at_the_root() {
        use mssc_constraints::WFlow;
        use mssc_engine::Propagator;
        use mssc_engine::Solver;

        const PAIR: f64 = 2.0;
        const FAR: f64 = 100.0;
        let pairs = [(0, 1), (2, 3), (4, 5)];
        let mut rows = vec![vec![FAR; 6]; 6];
        for i in 0..6 {
            rows[i][i] = 0.0;
        }
        for &(a, b) in &pairs {
            rows[a][b] = PAIR;
            rows[b][a] = PAIR;
        }
        let d = Dissimilarity::from_rows(rows);
        let instance = Rc::new(Instance::new(3, d, None, Some(vec![2, 2, 2]), None).unwrap());
        let mut solver = Solver::new(6, 3);
        let mut wflow = WFlow::new(Rc::clone(&instance));
        // First propagate binds observation 0 to cluster 0 via the virgin-
        // state special case; propagate again from that seeded state to get
        // the real bound.
        wflow.propagate(&mut solver).unwrap();
        wflow.propagate(&mut solver).unwrap();
        let expected = 3.0 * PAIR / 2.0;
        assert!(
            (solver.v_min() - (expected - mssc_core::EPS_FLOW)).abs() < 1e-6,
            "v_min = {}, expected ~{}",
            solver.v_min(),
            expected
        );
    }

    /// 1-D collinear points, asymmetric cardinalities.
    #[test]
    fn seed_test_3_collinear_asymmetric_cardinalities() {
        let xs = [0.0, 1.0, 2.0, 10.0, 11.0];
        let rows: Vec<Vec<f64>> = xs
            .iter()
            .map(|&a| xs.iter().map(|&b| (a - b) * (a - b)).collect())
            .collect();
        let d = Dissimilarity::from_rows(rows);
        let instance = Instance::new(2, d, None, Some(vec![3, 2]), None).unwrap();
        let solution = solve(instance, SolverConfig::default()).unwrap();
        assert!((solution.objective - 2.5).abs() < 1e-3);
    }

    /// On random small instances, the solver's objective matches
    /// brute-force enumeration under cardinality filtering.
    #[test]
    fn matches_brute_force_on_random_small_instances() {
        let mut rng = SmallRng::seed_from_u64(7);
        for trial in 0..8 {
            let n = 5 + trial % 3;
            let k = 2;
            let mut rows = vec![vec![0.0; n]; n];
            for i in 0..n {
                for j in (i + 1)..n {
                    let v: f64 = rng.random_range(1.0..20.0);
                    rows[i][j] = v;
                    rows[j][i] = v;
                }
            }
            let d = Dissimilarity::from_rows(rows);
            let target = if n == 5 { vec![3, 2] } else { vec![n / 2, n - n / 2] };
            let instance = Instance::new(k, d, None, Some(target), None).unwrap();
            let expected = brute_force(&instance);
            let solution = solve(instance, SolverConfig::default()).unwrap();
            assert!(
                (solution.objective - expected).abs() < 1e-3,
                "trial {trial}: solver {} != brute force {expected}",
                solution.objective
            );
        }
    }

    /// W-CARD and W-FLOW, posted individually against the same
    /// cardinality-constrained instance, agree on the optimum; only search
    /// effort (node count) differs, W-FLOW's stronger bound pruning at
    /// least as much as W-CARD's. W-GEN is excluded from this
    /// comparison: it ignores cardinalities entirely by design (see
    /// `propagators`), so it isn't solving the same constrained problem —
    /// its bound quality is covered separately by the unit tests in
    /// `mssc-constraints::wgen`.
    #[test]
    fn card_and_flow_bounds_agree_on_the_optimum() {
        let card = solve(
            seed_instance_1(),
            SolverConfig {
                bound: BoundMode::Card,
                strategy: StrategyConfig::default(),
            },
        )
        .unwrap();
        let flow = solve(
            seed_instance_1(),
            SolverConfig {
                bound: BoundMode::Flow,
                strategy: StrategyConfig::default(),
            },
        )
        .unwrap();
        assert!((card.objective - 1.0).abs() < 1e-3);
        assert!((flow.objective - 1.0).abs() < 1e-3);
        assert!(flow.nodes <= card.nodes);
    }

    /// Round trip (a): recomputing `V` from the solution's own assignment
    /// (via a fresh solver seeded with `assign`, exactly as `objective`
    /// expects) must reproduce `solution.objective` up to tolerance.
    #[test]
    fn round_trip_recomputed_objective_matches_solution_objective() {
        let instance = seed_instance_1();
        let solution = solve(instance.clone(), SolverConfig::default()).unwrap();

        let mut solver = Solver::new(instance.n(), instance.k());
        for (i, &c) in solution.assignment.iter().enumerate() {
            solver.assign(i, c).expect("solution assignment is always assignable on a fresh solver");
        }
        let recomputed = objective(&instance, &solver);
        assert!(
            (recomputed - solution.objective).abs() < 1e-6,
            "recomputed {recomputed} != reported {}",
            solution.objective
        );
    }

    /// Round trip (b): re-running the solver on a model seeded with the
    /// first solve's assignment as the initial solution (via
    /// `MembershipsAsIndicated`) must find no strictly better `V*`.
    #[test]
    fn round_trip_reseeding_from_prior_solution_finds_no_improvement() {
        let instance = seed_instance_1();
        let first = solve(instance.clone(), SolverConfig::default()).unwrap();

        let seeded = instance.with_memberships(first.assignment.clone()).unwrap();
        let second = solve(
            seeded,
            SolverConfig {
                bound: BoundMode::Flow,
                strategy: StrategyConfig {
                    initial: InitialMode::MembershipsAsIndicated,
                    main: MainMode::MaxMinVar,
                    tie: TieMode::FarthestPointFromBiggestCenter,
                },
            },
        )
        .unwrap();
        assert!(
            second.objective >= first.objective - 1e-6,
            "reseeded solve found a strictly better V* ({} < {}): first solve was not optimal",
            second.objective,
            first.objective
        );
    }

    /// Requesting W-GEN against a cardinality-constrained instance is
    /// silently upgraded to W-FLOW rather than returning an unconstrained
    /// (and therefore wrong) answer.
    #[test]
    fn w_gen_request_is_upgraded_when_targets_are_present() {
        let solution = solve(
            seed_instance_1(),
            SolverConfig {
                bound: BoundMode::Gen,
                strategy: StrategyConfig::default(),
            },
        )
        .unwrap();
        let mut counts = [0usize; 2];
        for &c in &solution.assignment {
            counts[c] += 1;
        }
        assert_eq!(counts, [2, 2]);
    }

    /// `BoundMode::Gen`, requested directly (not auto-upgraded) on a
    /// no-target instance, must agree with `BoundMode::Card`/`BoundMode::Flow`
    /// run on the same dissimilarities once a target vector is posted that
    /// simply matches the sizes W-GEN's own unconstrained optimum already
    /// settled on — a trivial (non-restricting) target, so all three
    /// constraints are solving literally the same problem. Catches an
    /// unsoundness regression in the no-cardinality W-GEN path itself,
    /// which the auto-upgrade test above never exercises.
    #[test]
    fn direct_w_gen_request_matches_card_and_flow_under_its_own_optimal_target() {
        let d = Dissimilarity::from_rows(vec![
            vec![0.0, 1.0, 9.0, 9.0],
            vec![1.0, 0.0, 9.0, 9.0],
            vec![9.0, 9.0, 0.0, 1.0],
            vec![9.0, 9.0, 1.0, 0.0],
        ]);
        let no_target = Instance::new(2, d.clone(), None, None, None).unwrap();
        let gen = solve(
            no_target,
            SolverConfig {
                bound: BoundMode::Gen,
                strategy: StrategyConfig::default(),
            },
        )
        .unwrap();

        let mut counts = vec![0usize; 2];
        for &c in &gen.assignment {
            counts[c] += 1;
        }
        let with_target = Instance::new(2, d, None, Some(counts), None).unwrap();

        let card = solve(
            with_target.clone(),
            SolverConfig {
                bound: BoundMode::Card,
                strategy: StrategyConfig::default(),
            },
        )
        .unwrap();
        let flow = solve(
            with_target,
            SolverConfig {
                bound: BoundMode::Flow,
                strategy: StrategyConfig::default(),
            },
        )
        .unwrap();

        assert!((gen.objective - card.objective).abs() < 1e-3);
        assert!((gen.objective - flow.objective).abs() < 1e-3);
    }

    #[test]
    fn solve_without_target_cardinalities_falls_back_to_w_gen() {
        let d = Dissimilarity::from_rows(vec![
            vec![0.0, 1.0, 9.0, 9.0],
            vec![1.0, 0.0, 9.0, 9.0],
            vec![9.0, 9.0, 0.0, 1.0],
            vec![9.0, 9.0, 1.0, 0.0],
        ]);
        let instance = Instance::new(2, d, None, None, None).unwrap();
        let solution = solve(
            instance,
            SolverConfig {
                bound: BoundMode::Flow,
                strategy: StrategyConfig::default(),
            },
        )
        .unwrap();
        assert!((solution.objective - 1.0).abs() < 1e-3);
    }
}
