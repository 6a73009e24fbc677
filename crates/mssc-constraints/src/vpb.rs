use mssc_engine::Fail;
use mssc_engine::Propagator;
use mssc_engine::Reversible;
use mssc_engine::Solver;

/// Value-precedence binary constraint (Law & Lee 2004): the first index
/// `i` with `x_i ∈ {s, t}` must satisfy `x_i = s`. Breaks value symmetry
/// (e.g. "cluster 0 appears no later than cluster 1") with generalized arc
/// consistency.
///
/// Three reversible pointers track the state between propagations (spec
/// §4.1):
/// - `alpha`: smallest index where `s` is still possible — candidate
///   "first `s`".
/// - `beta`: smallest index `> alpha` where `s` is still possible —
///   the backup support for `alpha`.
/// - `gamma`: smallest index fixed to `t` (or `n` if none).
///
/// If `beta` ever overtakes `gamma`, no index between them can serve as
/// the "first `s`" slot other than `alpha` itself, so `x_alpha` is forced
/// to `s`.
pub struct Vpb {
    s: usize,
    t: usize,
    alpha: Reversible<usize>,
    beta: Reversible<usize>,
    gamma: Reversible<usize>,
}

impl Vpb {
    pub fn new(solver: &Solver, s: usize, t: usize) -> Self {
        let n = solver.n();
        Self {
            s,
            t,
            alpha: Reversible::new(0),
            beta: Reversible::new(0),
            gamma: Reversible::new(n),
        }
    }

    /// Advances `alpha` past every index that has lost `s`, stripping `t`
    /// from each one along the way, then strips `t` from the index it
    /// lands on too — `x_alpha` can only ever become `s`, never `t`.
    fn advance_alpha(&mut self, solver: &mut Solver) -> Result<(), Fail> {
        let n = solver.n();
        let mut a = self.alpha.get();
        while a < n && !solver.contains(a, self.s) {
            solver.remove_value(a, self.t)?;
            a += 1;
        }
        if a < n {
            solver.remove_value(a, self.t)?;
        }
        self.alpha.set(solver.trail(), a);
        Ok(())
    }

    /// Advances `beta` to the smallest index past `alpha` that still has
    /// `s` in its domain.
    fn advance_beta(&mut self, solver: &mut Solver) {
        let n = solver.n();
        let alpha = self.alpha.get();
        let mut b = self.beta.get().max(alpha + 1);
        while b < n && !solver.contains(b, self.s) {
            b += 1;
        }
        if b != self.beta.get() {
            self.beta.set(solver.trail(), b);
        }
    }

    /// Recomputes `gamma` as the smallest index fixed to `t`.
    fn update_gamma(&mut self, solver: &mut Solver) {
        let n = solver.n();
        let g = (0..n)
            .find(|&i| solver.value(i) == Some(self.t))
            .unwrap_or(n);
        if g != self.gamma.get() {
            self.gamma.set(solver.trail(), g);
        }
    }
}

impl Propagator for Vpb {
    fn name(&self) -> &'static str {
        "vpb"
    }

    fn propagate(&mut self, solver: &mut Solver) -> Result<bool, Fail> {
        let before = (self.alpha.get(), self.beta.get(), self.gamma.get());

        self.advance_alpha(solver)?;
        if self.beta.get() <= self.alpha.get() {
            self.beta.set(solver.trail(), self.alpha.get());
        }
        self.advance_beta(solver);
        self.update_gamma(solver);

        if self.beta.get() > self.gamma.get() {
            let alpha = self.alpha.get();
            if alpha < solver.n() {
                solver.assign(alpha, self.s)?;
            }
        }

        Ok(before != (self.alpha.get(), self.beta.get(), self.gamma.get()))
    }
}
