use mssc_core::Instance;
use mssc_core::Weight;
use mssc_engine::Fail;
use mssc_engine::Solver;
use rayon::prelude::*;

/// `nb_add[c] = target[c] - sizeCluster[c]` for every cluster. Shared by
/// W-CARD and W-FLOW, the two constraints that exploit fixed target
/// cardinalities. Fails if a cluster already holds more points than its
/// target allows.
pub fn nb_add(instance: &Instance, solver: &Solver) -> Result<Vec<i64>, Fail> {
    let targets = instance.targets().expect("caller posted a target vector");
    let k = instance.k();
    let mut size_cluster = vec![0usize; k];
    for i in 0..solver.n() {
        if let Some(c) = solver.value(i) {
            size_cluster[c] += 1;
        }
    }
    let mut add = Vec::with_capacity(k);
    for c in 0..k {
        let remaining = targets[c] as i64 - size_cluster[c] as i64;
        if remaining < 0 {
            return Err(Fail);
        }
        add.push(remaining);
    }
    Ok(add)
}

/// Removes every cluster with no remaining slots (`nb_add[c] == 0`) from
/// every unassigned domain, repeating to a fixed point since each removal
/// can collapse a domain to a singleton and change cluster sizes. Shared
/// by W-CARD and W-FLOW as their preliminary domain-tightening pass.
pub fn saturate_cardinalities(instance: &Instance, solver: &mut Solver) -> Result<bool, Fail> {
    let mut changed = false;
    loop {
        let add = nb_add(instance, solver)?;
        let saturated: Vec<usize> = add
            .iter()
            .enumerate()
            .filter(|&(_, &a)| a == 0)
            .map(|(c, _)| c)
            .collect();
        if saturated.is_empty() {
            return Ok(changed);
        }
        let mut round_changed = false;
        for i in 0..solver.n() {
            if solver.is_fixed(i) {
                continue;
            }
            for &c in &saturated {
                if solver.contains(i, c) {
                    solver.remove_value(i, c)?;
                    round_changed = true;
                }
            }
        }
        if !round_changed {
            return Ok(changed);
        }
        changed = true;
    }
}

/// The shared per-propagation arrays every WCSS lower-bound constraint
/// rebuilds first: the cluster partition, the intra-cluster sums `S1`,
/// the point-to-cluster sums `s2`, and the prefix-summed half-distance
/// schedule `s3`.
///
/// Everything here is non-reversible scratch: fully recomputed on each
/// propagation, never trailed.
pub struct Bookkeeping {
    /// `P[c]`: indices already fixed to cluster `c`.
    pub p: Vec<Vec<usize>>,
    /// `U`: indices not yet fixed, in increasing order.
    pub u: Vec<usize>,
    /// `sizeCluster[c] = |P[c]|`.
    pub size_cluster: Vec<usize>,
    /// `q = |U|`.
    pub q: usize,
    /// `S1[c] = Σ_{i<j ∈ P[c]} D[i][j]`.
    pub s1: Vec<Weight>,
    /// `s2[u][c]`, valid only for `u ∈ U`; `+inf` where `c ∉ dom(x_u)`.
    pub s2: Vec<Vec<Weight>>,
    /// `s3[u][m]`, valid only for `u ∈ U`: sum of the `m` smallest
    /// half-distances from `u` to the other points of `U`, for
    /// `m ∈ [0, min(max_prefix, q - 1)]`.
    pub s3: Vec<Vec<Weight>>,
}

impl Bookkeeping {
    /// Rebuilds the shared arrays. `max_prefix` is the longest `s3` prefix
    /// any caller needs: `q` for W-GEN, `max_c nb_add[c]` for W-CARD/W-FLOW.
    pub fn build(instance: &Instance, solver: &Solver, max_prefix: usize) -> Self {
        let n = instance.n();
        let k = instance.k();

        let mut p: Vec<Vec<usize>> = vec![Vec::new(); k];
        let mut u = Vec::new();
        for i in 0..n {
            match solver.value(i) {
                Some(c) => p[c].push(i),
                None => u.push(i),
            }
        }
        let size_cluster: Vec<usize> = p.iter().map(|v| v.len()).collect();
        let q = u.len();

        let s1: Vec<Weight> = (0..k)
            .into_par_iter()
            .map(|c| {
                let pc = &p[c];
                let mut sum = 0.0;
                for a in 0..pc.len() {
                    for b in (a + 1)..pc.len() {
                        sum += instance.d(pc[a], pc[b]);
                    }
                }
                sum
            })
            .collect();

        let mut s2 = vec![vec![Weight::INFINITY; k]; n];
        let rows: Vec<(usize, Vec<Weight>)> = u
            .par_iter()
            .map(|&ui| {
                let mut row = vec![Weight::INFINITY; k];
                for c in 0..k {
                    if solver.contains(ui, c) {
                        row[c] = p[c].iter().map(|&j| instance.d(ui, j)).sum();
                    }
                }
                (ui, row)
            })
            .collect();
        for (ui, row) in rows {
            s2[ui] = row;
        }

        let l = max_prefix.min(q.saturating_sub(1));
        let mut s3 = vec![Vec::new(); n];
        let prefixes: Vec<(usize, Vec<Weight>)> = u
            .par_iter()
            .map(|&ui| {
                let mut half: Vec<Weight> = u
                    .iter()
                    .filter(|&&j| j != ui)
                    .map(|&j| instance.d(ui, j) / 2.0)
                    .collect();
                half.sort_by(|a, b| a.partial_cmp(b).expect("distances are finite"));
                let mut prefix = Vec::with_capacity(l + 1);
                let mut acc = 0.0;
                prefix.push(acc);
                for m in 0..l {
                    acc += half[m];
                    prefix.push(acc);
                }
                (ui, prefix)
            })
            .collect();
        for (ui, prefix) in prefixes {
            s3[ui] = prefix;
        }

        Self {
            p,
            u,
            size_cluster,
            q,
            s1,
            s2,
            s3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mssc_core::Dissimilarity;

    fn small_instance() -> Instance {
        let d = Dissimilarity::from_rows(vec![
            vec![0.0, 1.0, 9.0, 9.0],
            vec![1.0, 0.0, 9.0, 9.0],
            vec![9.0, 9.0, 0.0, 1.0],
            vec![9.0, 9.0, 1.0, 0.0],
        ]);
        Instance::new(2, d, None, Some(vec![2, 2]), None).unwrap()
    }

    #[test]
    fn fixed_points_contribute_to_s1_and_not_u() {
        let inst = small_instance();
        let mut solver = Solver::new(4, 2);
        solver.assign(0, 0).unwrap();
        let bk = Bookkeeping::build(&inst, &solver, 4);
        assert_eq!(bk.p[0], vec![0]);
        assert_eq!(bk.u, vec![1, 2, 3]);
        assert_eq!(bk.s1[0], 0.0);
        assert_eq!(bk.size_cluster, vec![1, 0]);
    }

    #[test]
    fn s2_is_infinite_outside_the_domain() {
        let inst = small_instance();
        let mut solver = Solver::new(4, 2);
        solver.assign(0, 0).unwrap();
        solver.remove_value(1, 1).unwrap();
        let bk = Bookkeeping::build(&inst, &solver, 4);
        assert_eq!(bk.s2[1][0], 1.0);
        assert!(bk.s2[1][1].is_infinite());
    }

    #[test]
    fn nb_add_fails_when_a_cluster_is_overfull() {
        let inst = small_instance();
        let mut solver = Solver::new(4, 2);
        solver.assign(0, 0).unwrap();
        solver.assign(1, 0).unwrap();
        solver.assign(2, 0).unwrap();
        assert!(nb_add(&inst, &solver).is_err());
    }

    #[test]
    fn saturate_removes_full_cluster_from_every_remaining_domain() {
        let inst = small_instance();
        let mut solver = Solver::new(4, 2);
        solver.assign(0, 0).unwrap();
        solver.assign(1, 0).unwrap();
        saturate_cardinalities(&inst, &mut solver).unwrap();
        assert_eq!(solver.value(2), Some(1));
        assert_eq!(solver.value(3), Some(1));
    }

    #[test]
    fn s3_prefix_sums_smallest_half_distances_excluding_self() {
        let inst = small_instance();
        let solver = Solver::new(4, 2);
        let bk = Bookkeeping::build(&inst, &solver, 4);
        // u = [0,1,2,3]; for point 0, others are 1,2,3 with D = 1,9,9 -> halves 0.5,4.5,4.5
        assert_eq!(bk.s3[0][0], 0.0);
        assert_eq!(bk.s3[0][1], 0.5);
        assert_eq!(bk.s3[0][2], 5.0);
        assert_eq!(bk.s3[0][3], 9.5);
    }
}
