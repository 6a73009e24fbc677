use mssc_core::Coord;
use mssc_core::Instance;
use mssc_core::Weight;
use mssc_engine::Solver;

/// `S1[c]` and `P[c]` for every cluster, recomputed from the solver's
/// current fixed assignment. The search strategy keeps its own tiny
/// partition snapshot rather than depending on `mssc-constraints`'
/// `Bookkeeping` — it only ever needs these two numbers per cluster, not
/// the full `s2`/`s3` scratch the WCSS bounds build.
pub struct Partition {
    pub s1: Vec<Weight>,
    pub size: Vec<usize>,
    pub members: Vec<Vec<usize>>,
}

impl Partition {
    pub fn build(instance: &Instance, solver: &Solver) -> Self {
        let k = instance.k();
        let mut members = vec![Vec::new(); k];
        for i in 0..instance.n() {
            if let Some(c) = solver.value(i) {
                members[c].push(i);
            }
        }
        let size = members.iter().map(|m| m.len()).collect();
        let s1 = members
            .iter()
            .map(|m| {
                let mut sum = 0.0;
                for a in 0..m.len() {
                    for b in (a + 1)..m.len() {
                        sum += instance.d(m[a], m[b]);
                    }
                }
                sum
            })
            .collect();
        Self { s1, size, members }
    }
}

/// The change in average intra-cluster dissimilarity from assigning `p`
/// into cluster `c`. Zero for an empty cluster — there is no existing
/// average to compare against yet.
pub fn delta_objective(instance: &Instance, partition: &Partition, p: usize, c: usize) -> Weight {
    let size = partition.size[c];
    if size == 0 {
        return 0.0;
    }
    let added: Weight = partition.members[c].iter().map(|&j| instance.d(j, p)).sum();
    let before = partition.s1[c] / size as Weight;
    let after = (partition.s1[c] + added) / (size + 1) as Weight;
    after - before
}

/// Squared Euclidean distance between two coordinate vectors, used by the
/// centroid-based tie-breakers.
pub fn squared_distance(a: &[Coord], b: &[Coord]) -> Coord {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Mean coordinate vector of a set of points, in the instance's `s`-space.
pub fn centroid(instance: &Instance, members: &[usize]) -> Vec<Coord> {
    let s = instance
        .s()
        .expect("coords required for centroid-based tie-breaking");
    let mut sum = vec![0.0; s];
    for &i in members {
        let coord = instance.coord(i).expect("instance carries coords");
        for (acc, &x) in sum.iter_mut().zip(coord) {
            *acc += x;
        }
    }
    let n = members.len().max(1) as Coord;
    sum.iter_mut().for_each(|x| *x /= n);
    sum
}
