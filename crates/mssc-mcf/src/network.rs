use mssc_core::Weight;
use petgraph::graph::DiGraph;
use petgraph::graph::EdgeIndex;
use petgraph::graph::NodeIndex;

/// One directed arc of the flow network. Every arc added via
/// [`Network::add_arc`] is paired with a zero-capacity residual twin in the
/// opposite direction, so the residual graph is always just "every arc
/// with `residual() > 0`" — the same representation the successive
/// shortest augmenting path solver and the W-FLOW residual-cost queries
/// both walk.
#[derive(Debug, Clone, Copy)]
pub struct Arc {
    pub capacity: i64,
    pub cost: Weight,
    pub flow: i64,
    pub forward: bool,
}

/// A directed flow network over `[0, n)` nodes, built on `petgraph::DiGraph`.
pub struct Network {
    pub(crate) graph: DiGraph<(), Arc>,
}

impl Network {
    pub fn new(nodes: usize) -> Self {
        let mut graph = DiGraph::new();
        for _ in 0..nodes {
            graph.add_node(());
        }
        Self { graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Adds a directed arc `from -> to` with the given capacity and
    /// per-unit cost, plus its zero-capacity residual twin `to -> from`.
    /// Returns the forward arc's edge index.
    pub fn add_arc(&mut self, from: usize, to: usize, capacity: i64, cost: Weight) -> EdgeIndex {
        let f = NodeIndex::new(from);
        let t = NodeIndex::new(to);
        let fwd = self.graph.add_edge(
            f,
            t,
            Arc {
                capacity,
                cost,
                flow: 0,
                forward: true,
            },
        );
        self.graph.add_edge(
            t,
            f,
            Arc {
                capacity: 0,
                cost: -cost,
                flow: 0,
                forward: false,
            },
        );
        fwd
    }

    /// Remaining capacity on an arc: `capacity - flow`, true for both
    /// forward arcs and their residual twins since pushing flow on one
    /// side frees up exactly that much residual capacity on the other.
    pub fn residual(&self, e: EdgeIndex) -> i64 {
        let a = &self.graph[e];
        a.capacity - a.flow
    }

    pub fn arc(&self, e: EdgeIndex) -> &Arc {
        &self.graph[e]
    }

    pub fn endpoints(&self, e: EdgeIndex) -> (usize, usize) {
        let (u, v) = self.graph.edge_endpoints(e).expect("edge index is valid");
        (u.index(), v.index())
    }

    /// Looks up the forward arc `from -> to`, if one was added. Lets a
    /// caller that rebuilt the same topology reapply a previously-found
    /// flow without re-running the augmenting-path search.
    pub fn arc_index(&self, from: usize, to: usize) -> Option<EdgeIndex> {
        let f = NodeIndex::new(from);
        let t = NodeIndex::new(to);
        self.graph
            .edges_connecting(f, t)
            .find(|e| e.weight().forward)
            .map(|e| e.id())
    }

    /// Pushes `amount` of flow along `e`, crediting its residual twin so
    /// the augmentation can later be canceled by a path that runs back
    /// through it.
    pub fn augment(&mut self, e: EdgeIndex, amount: i64) {
        let twin = EdgeIndex::new(e.index() ^ 1);
        self.graph[e].flow += amount;
        self.graph[twin].flow -= amount;
    }

    /// Realized flow on the forward arc `from -> to`, or `0` if no such
    /// arc exists.
    pub fn flow_on(&self, from: usize, to: usize) -> i64 {
        let f = NodeIndex::new(from);
        let t = NodeIndex::new(to);
        self.graph
            .edges_connecting(f, t)
            .find(|e| e.weight().forward)
            .map(|e| e.weight().flow)
            .unwrap_or(0)
    }

    /// Total cost of the current flow, summed over forward arcs only (the
    /// residual twins mirror it with the opposite sign and would double it).
    pub fn total_cost(&self) -> Weight {
        self.graph
            .edge_weights()
            .filter(|a| a.forward && a.flow > 0)
            .map(|a| a.flow as Weight * a.cost)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn augment_credits_the_residual_twin() {
        let mut net = Network::new(2);
        let e = net.add_arc(0, 1, 5, 2.0);
        assert_eq!(net.residual(e), 5);
        net.augment(e, 3);
        assert_eq!(net.residual(e), 2);
        assert_eq!(net.flow_on(0, 1), 3);
        assert_eq!(net.total_cost(), 6.0);
    }
}
