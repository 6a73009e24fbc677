use crate::bookkeeping::nb_add;
use crate::bookkeeping::saturate_cardinalities;
use crate::bookkeeping::Bookkeeping;
use mssc_core::EPS_FLOW;
use mssc_core::Instance;
use mssc_core::Weight;
use mssc_engine::Fail;
use mssc_engine::Propagator;
use mssc_engine::Reversible;
use mssc_engine::Solver;
use mssc_mcf::bellman_ford;
use mssc_mcf::Coupling;
use mssc_mcf::FlowSolver;
use mssc_mcf::Network;
use std::rc::Rc;

const SOURCE: usize = 0;
const SINK: usize = 1;

/// Reversible scratch carried across propagations: which cluster the last
/// solved (or replayed) min-cost flow routed each point to, and whether
/// each observation was fixed at the time. `destination[i]` doubles as
/// "did this arc carry flow": an unassigned `u`'s arc to `c` carried flow
/// iff `destination[u] == Some(c)`, so one array suffices for both.
#[derive(Clone)]
struct FlowMemo {
    destination: Vec<Option<usize>>,
    var_was_fixed: Vec<bool>,
    lb_global: Weight,
}

/// WCSS lower bound via min-cost flow: the strongest of the three bounds.
/// Formulates the remaining assignment as a transportation problem
/// (unassigned points as supply, clusters' remaining slots as demand),
/// solves it with [`FlowSolver`], then runs Bellman-Ford on the residual
/// network to filter values whose cheapest reroute still exceeds the
/// incumbent.
pub struct WFlow {
    instance: Rc<Instance>,
    memo: Reversible<FlowMemo>,
}

impl WFlow {
    pub fn new(instance: Rc<Instance>) -> Self {
        assert!(
            instance.targets().is_some(),
            "W-FLOW requires target cardinalities"
        );
        let n = instance.n();
        let memo = FlowMemo {
            destination: vec![None; n],
            var_was_fixed: vec![false; n],
            lb_global: Weight::NEG_INFINITY,
        };
        Self {
            instance,
            memo: Reversible::new(memo),
        }
    }

    /// `w(u, c) = (s2[u][c] + s3[u][nb_add[c]-1]) / target[c]`: the
    /// per-unit cost of the `u -> c` transportation arc. Also doubles as
    /// the residual-graph edge weight used by the reroute-cost filtering
    /// below.
    fn weight(bk: &Bookkeeping, targets: &[usize], nb_add: &[i64], u: usize, c: usize) -> Weight {
        let add = nb_add[c] as usize;
        (bk.s2[u][c] + bk.s3[u][add - 1]) / targets[c] as Weight
    }

    /// Re-solves the flow only if something relevant has changed since the
    /// last propagation; otherwise the previous solution is still optimal
    /// and can be replayed onto the freshly rebuilt topology.
    fn needs_resolve(&self, solver: &Solver, bk: &Bookkeeping) -> bool {
        let memo = self.memo.get();
        if !memo.lb_global.is_finite() {
            return true; // first run
        }
        for &u in &bk.u {
            match memo.destination[u] {
                None => return true,
                Some(c) => {
                    if !solver.contains(u, c) {
                        return true;
                    }
                }
            }
        }
        for i in 0..solver.n() {
            let fixed = solver.is_fixed(i);
            if memo.var_was_fixed[i] != fixed {
                return true;
            }
            if fixed && memo.destination[i] != solver.value(i) {
                return true;
            }
        }
        false
    }
}

impl Propagator for WFlow {
    fn name(&self) -> &'static str {
        "w-flow"
    }

    fn propagate(&mut self, solver: &mut Solver) -> Result<bool, Fail> {
        let mut changed = saturate_cardinalities(&self.instance, solver)?;

        if (0..solver.n()).all(|i| !solver.is_fixed(i)) {
            solver.assign(0, 0)?;
            return Ok(true);
        }

        let k = self.instance.k();
        let targets = self.instance.targets().expect("checked in new()");
        let add = nb_add(&self.instance, solver)?;
        let max_prefix = add.iter().copied().max().unwrap_or(0).max(0) as usize;
        let bk = Bookkeeping::build(&self.instance, solver, max_prefix);

        let active: Vec<usize> = (0..k).filter(|&c| add[c] > 0).collect();
        let mut u_pos = vec![None; solver.n()];
        for (idx, &u) in bk.u.iter().enumerate() {
            u_pos[u] = Some(idx);
        }
        let mut c_pos = vec![None; k];
        for (idx, &c) in active.iter().enumerate() {
            c_pos[c] = Some(idx);
        }
        let u_node = |u: usize| 2 + u_pos[u].expect("u is in U");
        let c_node = |c: usize| 2 + bk.q + c_pos[c].expect("c is active");

        let mut network = Network::new(2 + bk.q + active.len());
        for &u in &bk.u {
            network.add_arc(SOURCE, u_node(u), 1, 0.0);
            for &c in &active {
                if solver.contains(u, c) {
                    network.add_arc(u_node(u), c_node(c), 1, Self::weight(&bk, targets, &add, u, c));
                }
            }
        }
        for &c in &active {
            network.add_arc(c_node(c), SINK, add[c], 0.0);
        }

        let lb_base: Weight = (0..k).map(|c| bk.s1[c] / targets[c] as Weight).sum();

        let resolve = self.needs_resolve(solver, &bk);
        let (network, lb_global) = if resolve {
            let solved = FlowSolver::new(network, SOURCE, SINK, bk.q as i64)
                .solve()
                .map_err(|_| Fail)?;
            let lb_global = lb_base + solved.cost();
            (solved.into_network(), lb_global)
        } else {
            // Replay the previous solution onto the freshly-built (but
            // structurally identical, since `needs_resolve` was false)
            // topology, skipping the augmenting-path search entirely.
            let memo = self.memo.get();
            for &u in &bk.u {
                if let Some(c) = memo.destination[u] {
                    if let Some(e) = network.arc_index(u_node(u), c_node(c)) {
                        network.augment(e, 1);
                    }
                }
            }
            (network, memo.lb_global)
        };

        let bound = lb_global - EPS_FLOW;
        if bound > solver.v_min() {
            solver.tighten_min(bound);
            changed = true;
        }
        if solver.v_min() > solver.v_max() {
            return Err(Fail);
        }

        let mut destination = vec![None; solver.n()];
        for i in 0..solver.n() {
            if let Some(v) = solver.value(i) {
                destination[i] = Some(v);
            }
        }
        for &u in &bk.u {
            for &c in &active {
                if network.flow_on(u_node(u), c_node(c)) == 1 {
                    destination[u] = Some(c);
                    break;
                }
            }
        }
        for &c in &active {
            for &u in &bk.u {
                if !solver.contains(u, c) {
                    continue;
                }
                let c0 = destination[u].expect("every u in U received flow");
                if c0 == c {
                    continue; // this arc already carries the flow
                }
                let delta_direct = Self::weight(&bk, targets, &add, u, c)
                    - Self::weight(&bk, targets, &add, u, c0);
                let sp = bellman_ford(&network, c_node(c), &[u_node(u)]);
                let reroute = sp.distance(c_node(c0));
                if !reroute.is_finite() {
                    // No way to free up c's capacity without touching u:
                    // x_u = c cannot be completed at all. `remove_value`
                    // itself fails if this empties u's domain.
                    solver.remove_value(u, c)?;
                    changed = true;
                    continue;
                }
                let delta = delta_direct + reroute;
                if lb_global + delta > solver.v_max() {
                    solver.remove_value(u, c)?;
                    changed = true;
                }
            }
        }

        // Recomputed after filtering: a value removal above may have
        // collapsed some u's domain to its own destination, newly fixing it.
        let var_was_fixed: Vec<bool> = (0..solver.n()).map(|i| solver.is_fixed(i)).collect();
        self.memo.set(
            solver.trail(),
            FlowMemo {
                destination,
                var_was_fixed,
                lb_global,
            },
        );

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mssc_core::Dissimilarity;

    fn seed_instance() -> Rc<Instance> {
        let d = Dissimilarity::from_rows(vec![
            vec![0.0, 1.0, 9.0, 9.0],
            vec![1.0, 0.0, 9.0, 9.0],
            vec![9.0, 9.0, 0.0, 1.0],
            vec![9.0, 9.0, 1.0, 0.0],
        ]);
        Rc::new(Instance::new(2, d, None, Some(vec![2, 2]), None).unwrap())
    }

    #[test]
    fn binds_first_observation_to_cluster_zero_on_virgin_state() {
        let instance = seed_instance();
        let mut solver = Solver::new(4, 2);
        let mut wflow = WFlow::new(instance);
        wflow.propagate(&mut solver).unwrap();
        assert_eq!(solver.value(0), Some(0));
    }

    #[test]
    fn mcf_bound_matches_optimum_on_clean_symmetric_instance() {
        let instance = seed_instance();
        let mut solver = Solver::new(4, 2);
        solver.assign(0, 0).unwrap();
        let mut wflow = WFlow::new(instance);
        wflow.propagate(&mut solver).unwrap();
        // {0,1}/{2,3}: V = 1/2 + 1/2 = 1, exactly tight for this instance.
        assert!((solver.v_min() - (1.0 - EPS_FLOW)).abs() < 1e-6);
    }

    #[test]
    fn saturated_cluster_is_removed_from_every_remaining_domain() {
        let instance = seed_instance();
        let mut solver = Solver::new(4, 2);
        solver.assign(0, 0).unwrap();
        solver.assign(1, 0).unwrap();
        let mut wflow = WFlow::new(instance);
        wflow.propagate(&mut solver).unwrap();
        assert_eq!(solver.value(2), Some(1));
        assert_eq!(solver.value(3), Some(1));
    }

    #[test]
    fn incrementality_reuses_the_cached_bound_when_nothing_relevant_changed() {
        let instance = seed_instance();
        let mut solver = Solver::new(4, 2);
        solver.assign(0, 0).unwrap();
        let mut wflow = WFlow::new(instance);
        wflow.propagate(&mut solver).unwrap();
        let first = solver.v_min();
        // No variable newly fixed, no destination invalidated: a second
        // propagate should reuse the cached bound rather than re-derive a
        // different (even if numerically equal) one from scratch.
        let second_changed = wflow.propagate(&mut solver).unwrap();
        assert!(!second_changed);
        assert_eq!(solver.v_min(), first);
    }

    #[test]
    fn negative_remaining_slots_fails() {
        let instance = seed_instance();
        let mut solver = Solver::new(4, 2);
        solver.assign(0, 0).unwrap();
        solver.assign(1, 0).unwrap();
        solver.assign(2, 0).unwrap();
        let mut wflow = WFlow::new(instance);
        assert!(wflow.propagate(&mut solver).is_err());
    }
}
