use crate::network::Network;
use crate::path::bellman_ford;
use mssc_core::Weight;

/// A transport plan between a source and a sink, optimized for total cost.
///
/// Specialized to a single source/sink pair over node indices: the W-FLOW
/// bound only ever needs a min-cost flow on the bipartite transportation
/// network it builds, not a general multi-commodity coupling.
pub trait Coupling {
    /// Optimizes the flow to minimize total cost, consuming and returning
    /// `self` so the call site reads as a pipeline: `solver.minimize()`.
    fn minimize(self) -> Self;
    /// Units of flow realized on the arc `from -> to`.
    fn flow(&self, from: usize, to: usize) -> i64;
    /// Total cost of the current flow.
    fn cost(&self) -> Weight;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowError {
    /// No feasible flow of `required` units exists from source to sink.
    Infeasible,
}

impl std::fmt::Display for FlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowError::Infeasible => write!(f, "no feasible flow satisfies the required supply"),
        }
    }
}

impl std::error::Error for FlowError {}

/// A reference min-cost flow solver: successive shortest augmenting paths
/// via Bellman-Ford (not Dijkstra, since the residual graph carries
/// negative-cost arcs once any flow has been pushed).
pub struct FlowSolver {
    network: Network,
    source: usize,
    sink: usize,
    required: i64,
}

impl FlowSolver {
    /// Unwraps the solved network, e.g. for a caller that needs to run
    /// further residual-graph queries against it (W-FLOW's Δ-reasoning).
    pub fn into_network(self) -> Network {
        self.network
    }

    pub fn new(network: Network, source: usize, sink: usize, required: i64) -> Self {
        Self {
            network,
            source,
            sink,
            required,
        }
    }

    /// Runs successive shortest augmenting paths until either `required`
    /// units have been pushed from source to sink, or no augmenting path
    /// remains (the network cannot supply that much flow).
    pub fn solve(mut self) -> Result<Self, FlowError> {
        let mut pushed = 0;
        while pushed < self.required {
            let sp = bellman_ford(&self.network, self.source, &[]);
            let Some(path) = sp.path_to(&self.network, self.sink) else {
                return Err(FlowError::Infeasible);
            };
            let bottleneck = path
                .iter()
                .map(|&e| self.network.residual(e))
                .min()
                .unwrap_or(0)
                .min(self.required - pushed);
            if bottleneck <= 0 {
                return Err(FlowError::Infeasible);
            }
            for e in path {
                self.network.augment(e, bottleneck);
            }
            pushed += bottleneck;
        }
        Ok(self)
    }
}

impl Coupling for FlowSolver {
    fn minimize(self) -> Self {
        self.solve().expect("network was constructed with a feasible supply")
    }

    fn flow(&self, from: usize, to: usize) -> i64 {
        self.network.flow_on(from, to)
    }

    fn cost(&self) -> Weight {
        self.network.total_cost()
    }
}
