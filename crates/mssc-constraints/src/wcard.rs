use crate::bookkeeping::nb_add;
use crate::bookkeeping::saturate_cardinalities;
use crate::bookkeeping::Bookkeeping;
use mssc_core::EPS_GEN_CARD;
use mssc_core::Instance;
use mssc_core::Weight;
use mssc_engine::Fail;
use mssc_engine::Propagator;
use mssc_engine::Solver;
use std::rc::Rc;

/// WCSS lower bound exploiting fixed target cardinalities. Unlike W-GEN,
/// no DP over schedules is needed: because every cluster's
/// final size is known in advance, only two schedules per cluster matter
/// — "fill every remaining slot" and "reserve one slot" — so the global
/// bound is a plain sum, and it's strictly tighter than W-GEN's.
pub struct WCard {
    instance: Rc<Instance>,
}

impl WCard {
    pub fn new(instance: Rc<Instance>) -> Self {
        assert!(
            instance.targets().is_some(),
            "W-CARD requires target cardinalities"
        );
        Self { instance }
    }
}

impl Propagator for WCard {
    fn name(&self) -> &'static str {
        "w-card"
    }

    fn propagate(&mut self, solver: &mut Solver) -> Result<bool, Fail> {
        let mut changed = saturate_cardinalities(&self.instance, solver)?;

        if (0..solver.n()).all(|i| !solver.is_fixed(i)) {
            solver.assign(0, 0)?;
            return Ok(true);
        }

        let nb_add = nb_add(&self.instance, solver)?;
        let k = self.instance.k();
        let max_prefix = nb_add.iter().copied().max().unwrap_or(0).max(0) as usize;
        let bk = Bookkeeping::build(&self.instance, solver, max_prefix);

        let mut sched0 = vec![0.0; k]; // nb_add[c] slots filled
        let mut sched1 = vec![0.0; k]; // nb_add[c] - 1 slots filled
        for c in 0..k {
            let add = nb_add[c] as usize;
            if add == 0 {
                sched0[c] = bk.s1[c] / bk.size_cluster[c].max(1) as Weight;
                sched1[c] = sched0[c];
                continue;
            }
            let mut keys: Vec<Weight> = bk
                .u
                .iter()
                .filter_map(|&u| {
                    let key = bk.s2[u][c] + bk.s3[u][add - 1];
                    (solver.contains(u, c) && key.is_finite()).then_some(key)
                })
                .collect();
            keys.sort_by(|a, b| a.partial_cmp(b).expect("finite"));
            if keys.len() < add {
                return Err(Fail);
            }
            let full: Weight = keys[..add].iter().sum();
            sched0[c] = (bk.s1[c] + full) / (bk.size_cluster[c] + add) as Weight;
            let reserved: Weight = keys[..add - 1].iter().sum();
            sched1[c] = (bk.s1[c] + reserved) / (bk.size_cluster[c] + add - 1).max(1) as Weight;
        }

        let lb_global: Weight = sched0.iter().sum();
        let bound = lb_global - EPS_GEN_CARD;
        if bound > solver.v_min() {
            solver.tighten_min(bound);
            changed = true;
        }
        if solver.v_min() > solver.v_max() {
            return Err(Fail);
        }

        for c in 0..k {
            if nb_add[c] == 0 {
                continue;
            }
            let lb_except = lb_global - sched0[c];
            for &i in &bk.u {
                if !solver.contains(i, c) {
                    continue;
                }
                let add = nb_add[c] as usize;
                let lb_prime = ((bk.size_cluster[c] + add - 1) as Weight * sched1[c]
                    + bk.s2[i][c]
                    + bk.s3[i][add - 1])
                    / (bk.size_cluster[c] + add) as Weight;
                let v_prime = lb_except + lb_prime;
                if v_prime >= solver.v_max() {
                    solver.remove_value(i, c)?;
                    changed = true;
                }
            }
        }

        Ok(changed)
    }
}
