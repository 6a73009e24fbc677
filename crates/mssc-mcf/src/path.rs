use crate::network::Network;
use mssc_core::Weight;
use petgraph::graph::EdgeIndex;

const EPS: Weight = 1e-9;

/// Single-source shortest residual-cost distances, computed with the
/// Bellman-Ford algorithm rather than Dijkstra because the residual graph
/// carries negative-cost arcs (every augmentation's residual twin).
///
/// This is hand-rolled rather than `petgraph::algo::bellman_ford` for two
/// reasons the generic algorithm doesn't support: arcs with zero residual
/// capacity must be skipped entirely (petgraph's version has no notion of
/// capacity), and a caller-supplied node exclusion set must be honored
/// (used by the W-FLOW bound's residual-graph cost reasoning to query
/// shortest paths that avoid a particular cluster or point).
pub struct ShortestPaths {
    dist: Vec<Weight>,
    pred: Vec<Option<EdgeIndex>>,
    source: usize,
}

impl ShortestPaths {
    /// Shortest residual-cost distance from the source to `node`, or
    /// `+inf` if unreachable.
    pub fn distance(&self, node: usize) -> Weight {
        self.dist[node]
    }

    /// Reconstructs the shortest path to `target` as a sequence of edge
    /// indices, or `None` if `target` is unreachable.
    pub fn path_to(&self, network: &Network, target: usize) -> Option<Vec<EdgeIndex>> {
        if !self.dist[target].is_finite() {
            return None;
        }
        let mut path = Vec::new();
        let mut cur = target;
        while cur != self.source {
            let e = self.pred[cur]?;
            path.push(e);
            let (u, _) = network.endpoints(e);
            cur = u;
        }
        path.reverse();
        Some(path)
    }
}

/// Runs Bellman-Ford from `source` over `network`'s residual arcs,
/// skipping any arc incident to a node in `excluded`. Stops early once a
/// full relaxation pass makes no further improvement, instead of always
/// running the full `n - 1` passes: the bipartite transportation networks
/// this bound operates on converge in far fewer rounds in practice.
pub fn bellman_ford(network: &Network, source: usize, excluded: &[usize]) -> ShortestPaths {
    let n = network.node_count();
    let mut dist = vec![Weight::INFINITY; n];
    let mut pred: Vec<Option<EdgeIndex>> = vec![None; n];
    dist[source] = 0.0;

    for _ in 0..n.saturating_sub(1) {
        let mut changed = false;
        for e in network.graph.edge_indices() {
            if network.residual(e) <= 0 {
                continue;
            }
            let (u, v) = network.endpoints(e);
            if excluded.contains(&u) || excluded.contains(&v) {
                continue;
            }
            if !dist[u].is_finite() {
                continue;
            }
            let candidate = dist[u] + network.arc(e).cost;
            if candidate < dist[v] - EPS {
                dist[v] = candidate;
                pred[v] = Some(e);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    ShortestPaths { dist, pred, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortest_path_follows_cheapest_route() {
        let mut net = Network::new(4);
        net.add_arc(0, 1, 10, 1.0);
        net.add_arc(0, 2, 10, 5.0);
        net.add_arc(1, 3, 10, 1.0);
        net.add_arc(2, 3, 10, 1.0);
        let sp = bellman_ford(&net, 0, &[]);
        assert_eq!(sp.distance(3), 2.0);
        assert_eq!(sp.path_to(&net, 3).unwrap().len(), 2);
    }

    #[test]
    fn excluded_node_forces_a_detour() {
        let mut net = Network::new(4);
        net.add_arc(0, 1, 10, 1.0);
        net.add_arc(0, 2, 10, 5.0);
        net.add_arc(1, 3, 10, 1.0);
        net.add_arc(2, 3, 10, 1.0);
        let sp = bellman_ford(&net, 0, &[1]);
        assert_eq!(sp.distance(3), 6.0);
    }

    #[test]
    fn unreachable_node_has_infinite_distance() {
        let net = Network::new(2);
        let sp = bellman_ford(&net, 0, &[]);
        assert!(sp.distance(1).is_infinite());
        assert!(sp.path_to(&net, 1).is_none());
    }
}
