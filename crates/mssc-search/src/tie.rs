use crate::util::centroid;
use crate::util::squared_distance;
use crate::util::Partition;
use mssc_core::scaled_ss;
use mssc_core::Coord;
use mssc_core::Instance;
use mssc_core::Weight;
use mssc_engine::Solver;
use rayon::prelude::*;

/// Tie-breaking mode: which heuristic picks the next point to seed into the
/// lowest cluster index not yet occupied by a fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieMode {
    /// Fall back to whatever main search last proposed.
    None,
    /// Maximize total dissimilarity to every unbound observation.
    UnboundFarthestTotalSs,
    /// Maximize distance to the farthest already-fixed observation.
    FixedFarthestDist,
    /// Maximize the minimum distance to any occupied cluster's members.
    FixedMaxMin,
    /// Maximize squared distance to the centroid of the largest cluster.
    FarthestPointFromBiggestCenter,
    /// Maximize the minimum squared distance to any cluster's centroid.
    MaxMinPointFromAllCenters,
}

/// Picks the lowest cluster index with no fixed member, then an unfixed
/// observation that still allows that cluster, scored by `mode`. Falls
/// back to `previous` (main search's last proposal, usually a zero-delta
/// tie) when `mode` is `None` or there is nothing left to seed.
pub fn choose(
    mode: TieMode,
    instance: &Instance,
    solver: &Solver,
    previous: Option<(usize, usize)>,
) -> Option<(usize, usize)> {
    if mode == TieMode::None {
        return previous;
    }
    let partition = Partition::build(instance, solver);
    let Some(target_cluster) = lowest_unoccupied_cluster(&partition) else {
        return previous;
    };
    let candidates: Vec<usize> = (0..solver.n())
        .filter(|&i| !solver.is_fixed(i) && solver.contains(i, target_cluster))
        .collect();
    if candidates.is_empty() {
        return previous;
    }

    let chosen = match mode {
        TieMode::None => unreachable!("handled above"),
        TieMode::UnboundFarthestTotalSs => unbound_farthest_total_ss(instance, solver, &candidates),
        TieMode::FixedFarthestDist => fixed_farthest_dist(instance, solver, &candidates),
        TieMode::FixedMaxMin => fixed_max_min(instance, &partition, &candidates),
        TieMode::FarthestPointFromBiggestCenter => {
            farthest_point_from_biggest_center(instance, &partition, &candidates)
        }
        TieMode::MaxMinPointFromAllCenters => {
            max_min_point_from_all_centers(instance, &partition, &candidates)
        }
    };

    chosen.map(|i| (i, target_cluster))
}

/// Value-precedence symmetry breaking fills clusters in index order, so the
/// first empty slot scanning low-to-high is the only sound seed target.
fn lowest_unoccupied_cluster(partition: &Partition) -> Option<usize> {
    partition.size.iter().position(|&size| size == 0)
}

fn unbound_farthest_total_ss(instance: &Instance, solver: &Solver, candidates: &[usize]) -> Option<usize> {
    let unbound: Vec<usize> = (0..solver.n()).filter(|&i| !solver.is_fixed(i)).collect();
    candidates
        .par_iter()
        .copied()
        .max_by_key(|&i| {
            let total: Weight = unbound.iter().map(|&j| instance.d(i, j)).sum();
            scaled_ss(total)
        })
}

fn fixed_farthest_dist(instance: &Instance, solver: &Solver, candidates: &[usize]) -> Option<usize> {
    let fixed: Vec<usize> = (0..solver.n()).filter(|&i| solver.is_fixed(i)).collect();
    candidates
        .par_iter()
        .copied()
        .max_by_key(|&i| {
            let farthest = fixed
                .iter()
                .map(|&j| instance.d(i, j))
                .fold(0.0, Weight::max);
            scaled_ss(farthest)
        })
}

fn fixed_max_min(instance: &Instance, partition: &Partition, candidates: &[usize]) -> Option<usize> {
    candidates
        .par_iter()
        .copied()
        .max_by_key(|&i| {
            let min_over_clusters = partition
                .members
                .iter()
                .filter(|m| !m.is_empty())
                .map(|m| {
                    m.iter()
                        .map(|&j| instance.d(i, j))
                        .fold(Weight::INFINITY, Weight::min)
                })
                .fold(Weight::INFINITY, Weight::min);
            scaled_ss(min_over_clusters)
        })
}

fn farthest_point_from_biggest_center(
    instance: &Instance,
    partition: &Partition,
    candidates: &[usize],
) -> Option<usize> {
    let (biggest, _) = partition.size.iter().enumerate().max_by_key(|&(_, &s)| s)?;
    let center = centroid(instance, &partition.members[biggest]);
    candidates
        .par_iter()
        .copied()
        .max_by_key(|&i| {
            let coord = instance
                .coord(i)
                .expect("coords required for this tie-breaker");
            scaled_ss(squared_distance(coord, &center))
        })
}

fn max_min_point_from_all_centers(
    instance: &Instance,
    partition: &Partition,
    candidates: &[usize],
) -> Option<usize> {
    let centers: Vec<Vec<Coord>> = partition
        .members
        .iter()
        .filter(|m| !m.is_empty())
        .map(|m| centroid(instance, m))
        .collect();
    candidates
        .par_iter()
        .copied()
        .max_by_key(|&i| {
            let coord = instance
                .coord(i)
                .expect("coords required for this tie-breaker");
            let min_d = centers
                .iter()
                .map(|c| squared_distance(coord, c))
                .fold(Coord::INFINITY, Coord::min);
            scaled_ss(min_d)
        })
}
