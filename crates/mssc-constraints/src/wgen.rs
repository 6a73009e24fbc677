use crate::bookkeeping::Bookkeeping;
use mssc_core::EPS_GEN_CARD;
use mssc_core::Instance;
use mssc_core::Weight;
use mssc_engine::Fail;
use mssc_engine::Propagator;
use mssc_engine::Solver;
use std::rc::Rc;

const INF: Weight = Weight::INFINITY;

/// General WCSS lower-bound constraint: a dynamic-programming bound over
/// cluster schedules that ignores target cardinalities entirely. The
/// weakest of the three WCSS bounds, but the only one that applies when
/// no target cardinality vector is posted.
pub struct WGen {
    instance: Rc<Instance>,
}

impl WGen {
    pub fn new(instance: Rc<Instance>) -> Self {
        Self { instance }
    }

    /// `lb_sched[c][m]`: the best achievable average intra-cluster
    /// dissimilarity for cluster `c` if it ends up absorbing `m` more of
    /// the unassigned points, for every `m ∈ [0, q]`.
    fn lb_sched(&self, bk: &Bookkeeping) -> Vec<Vec<Weight>> {
        let k = self.instance.k();
        let q = bk.q;
        let mut sched = vec![vec![INF; q + 1]; k];
        for c in 0..k {
            sched[c][0] = if bk.size_cluster[c] > 0 {
                bk.s1[c] / bk.size_cluster[c] as Weight
            } else {
                0.0
            };
            for m in 1..=q {
                let mut keys: Vec<Weight> = bk
                    .u
                    .iter()
                    .filter_map(|&u| {
                        let key = bk.s2[u][c] + bk.s3[u][m - 1];
                        key.is_finite().then_some(key)
                    })
                    .collect();
                if keys.len() < m {
                    continue; // not enough admissible points to fill this schedule
                }
                keys.sort_by(|a, b| a.partial_cmp(b).expect("finite"));
                let sum: Weight = keys[..m].iter().sum();
                sched[c][m] = (bk.s1[c] + sum) / (bk.size_cluster[c] + m) as Weight;
            }
        }
        sched
    }

    /// `F[c][m]`: minimum total bound over clusters `0..=c` when they
    /// absorb `m` of the unassigned points between them, by the
    /// partition-DP recurrence over per-cluster schedules.
    fn global_dp(&self, q: usize, sched: &[Vec<Weight>]) -> Vec<Vec<Weight>> {
        let k = self.instance.k();
        let mut f = vec![vec![INF; q + 1]; k];
        f[0] = sched[0].clone();
        for c in 1..k {
            for m in 0..=q {
                let mut best = INF;
                for i in 0..=m {
                    let candidate = f[c - 1][i] + sched[c][m - i];
                    if candidate < best {
                        best = candidate;
                    }
                }
                f[c][m] = best;
            }
        }
        f
    }
}

impl Propagator for WGen {
    fn name(&self) -> &'static str {
        "w-gen"
    }

    fn propagate(&mut self, solver: &mut Solver) -> Result<bool, Fail> {
        let k = self.instance.k();
        let bk = Bookkeeping::build(&self.instance, solver, usize::MAX);
        let q = bk.q;
        let sched = self.lb_sched(&bk);
        let f = self.global_dp(q, &sched);

        let lb_global = f[k - 1][q];
        if !lb_global.is_finite() {
            return Err(Fail);
        }

        let mut changed = false;
        let bound = lb_global - EPS_GEN_CARD;
        if bound > solver.v_min() {
            solver.tighten_min(bound);
            changed = true;
        }
        if solver.v_min() > solver.v_max() {
            return Err(Fail);
        }

        for c in 0..k {
            // lb_except[m] = max_{j>=m} (F[K-1][j] - lb_sched[c][j-m])
            let mut lb_except = vec![Weight::NEG_INFINITY; q + 1];
            for m in 0..=q {
                let mut best = Weight::NEG_INFINITY;
                for j in m..=q {
                    let candidate = f[k - 1][j] - sched[c][j - m];
                    if candidate > best {
                        best = candidate;
                    }
                }
                lb_except[m] = best;
            }

            for &i in &bk.u {
                if !solver.contains(i, c) {
                    continue;
                }
                let mut v_prime = INF;
                for m in 0..q {
                    let lb_prime = ((bk.size_cluster[c] + m) as Weight * sched[c][m]
                        + bk.s2[i][c]
                        + bk.s3[i][m])
                        / (bk.size_cluster[c] + m + 1) as Weight;
                    let candidate = lb_except[q - 1 - m] + lb_prime;
                    if candidate < v_prime {
                        v_prime = candidate;
                    }
                }
                if v_prime >= solver.v_max() {
                    solver.remove_value(i, c)?;
                    changed = true;
                }
            }
        }

        Ok(changed)
    }
}
