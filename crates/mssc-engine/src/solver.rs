use crate::trail::Reversible;
use crate::trail::Trail;

/// Signals that a propagator, assignment, or value removal has proven the
/// current node infeasible. Carries no payload: the caller's job is simply
/// to backtrack, not to diagnose why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fail;

/// The constraint-programming store: one finite domain per observation
/// (over `[0, k)` cluster labels), plus the objective variable V split into
/// two halves: `V.min`, a reversible per-node lower bound tightened by
/// propagation, and `V.max`, the best objective found so far.
///
/// `V.max` is deliberately **not** trailed. An incumbent solution remains a
/// valid upper bound for every other node in the tree, including siblings
/// reached only after backtracking past the node that found it — trailing
/// it would throw away the improvement the moment the search backs up.
pub struct Solver {
    n: usize,
    k: usize,
    domains: Vec<Reversible<Vec<bool>>>,
    sizes: Vec<Reversible<usize>>,
    v_min: Reversible<f64>,
    v_max: f64,
    trail: Trail,
    nodes: usize,
}

impl Solver {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            domains: (0..n).map(|_| Reversible::new(vec![true; k])).collect(),
            sizes: (0..n).map(|_| Reversible::new(k)).collect(),
            v_min: Reversible::new(0.0),
            v_max: f64::INFINITY,
            trail: Trail::new(),
            nodes: 0,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }
    pub fn k(&self) -> usize {
        self.k
    }
    pub fn nodes(&self) -> usize {
        self.nodes
    }
    pub fn depth(&self) -> usize {
        self.trail.depth()
    }

    /// Whether `c` is still in observation `i`'s domain.
    pub fn contains(&self, i: usize, c: usize) -> bool {
        self.domains[i].with(|d| d[c])
    }

    /// Remaining domain size for observation `i`.
    pub fn size(&self, i: usize) -> usize {
        self.sizes[i].get()
    }

    pub fn is_fixed(&self, i: usize) -> bool {
        self.size(i) == 1
    }

    /// The assigned cluster for `i`, if its domain has collapsed to one value.
    pub fn value(&self, i: usize) -> Option<usize> {
        if self.is_fixed(i) {
            self.domains[i].with(|d| d.iter().position(|&allowed| allowed))
        } else {
            None
        }
    }

    /// The remaining candidate clusters for `i`, in increasing order.
    pub fn domain(&self, i: usize) -> Vec<usize> {
        self.domains[i].with(|d| {
            d.iter()
                .enumerate()
                .filter(|(_, &allowed)| allowed)
                .map(|(c, _)| c)
                .collect()
        })
    }

    /// Removes `c` from `i`'s domain. A no-op if `c` was already excluded.
    /// Fails if this empties the domain.
    pub fn remove_value(&mut self, i: usize, c: usize) -> Result<(), Fail> {
        if !self.contains(i, c) {
            return Ok(());
        }
        let mut domain = self.domains[i].get();
        domain[c] = false;
        self.domains[i].set(&mut self.trail, domain);
        let new_size = self.sizes[i].get() - 1;
        self.sizes[i].set(&mut self.trail, new_size);
        if new_size == 0 {
            return Err(Fail);
        }
        Ok(())
    }

    /// Assigns `i := c`, excluding every other value from its domain. Fails
    /// if `c` is not currently in `i`'s domain (including the case where
    /// `i` is already fixed to a different value).
    pub fn assign(&mut self, i: usize, c: usize) -> Result<(), Fail> {
        if !self.contains(i, c) {
            return Err(Fail);
        }
        for v in 0..self.k {
            if v != c {
                self.remove_value(i, v)?;
            }
        }
        Ok(())
    }

    /// Current node's lower bound on the objective (reversible).
    pub fn v_min(&self) -> f64 {
        self.v_min.get()
    }
    /// Best objective found anywhere in the tree so far (global, monotone).
    pub fn v_max(&self) -> f64 {
        self.v_max
    }

    /// Tightens `V.min` at the current node. A propagator that computes a
    /// weaker bound than what's already recorded is a no-op, not a regression.
    pub fn tighten_min(&mut self, lb: f64) {
        if lb > self.v_min.get() {
            self.v_min.set(&mut self.trail, lb);
        }
    }

    /// Records a feasible solution's objective as the new incumbent, if it
    /// improves on the current one.
    pub fn record_incumbent(&mut self, value: f64) {
        if value < self.v_max {
            self.v_max = value;
        }
    }

    pub fn checkpoint(&mut self) {
        self.trail.mark();
    }
    pub fn backtrack(&mut self) {
        self.trail.undo_to_mark();
    }
    pub fn count_node(&mut self) {
        self.nodes += 1;
    }

    /// Exposes the solver's trail so a constraint can register reversible
    /// scalars of its own, e.g. VPB's α/β/γ pointers or W-FLOW's
    /// `destination`/`hasFlow` scratch.
    pub fn trail(&mut self) -> &mut Trail {
        &mut self.trail
    }
}
