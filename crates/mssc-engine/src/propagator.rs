use crate::solver::Fail;
use crate::solver::Solver;

/// A global constraint. `propagate` is called repeatedly to a fixed point
/// (see [`crate::search::fixpoint`]): it should remove every domain value
/// and tighten `V.min` as far as it can justify from the *current* domains,
/// then return whether it changed anything so the driver knows whether
/// another round is worth running.
pub trait Propagator {
    fn name(&self) -> &'static str;

    /// Runs one round of filtering.
    ///
    /// Returns `Ok(true)` if some domain or `V.min` changed, `Ok(false)` if
    /// this round was a no-op, `Err(Fail)` if the propagator proved the
    /// current node infeasible (either the bound check `V.min > V.max`
    /// failed, or a domain went empty).
    fn propagate(&mut self, solver: &mut Solver) -> Result<bool, Fail>;
}

/// Runs every propagator in order, repeating full rounds until none of them
/// report a change (a fixed point) or one of them fails.
pub fn fixpoint(solver: &mut Solver, propagators: &mut [Box<dyn Propagator>]) -> Result<(), Fail> {
    loop {
        let mut changed = false;
        for p in propagators.iter_mut() {
            if p.propagate(solver)? {
                changed = true;
            }
            if solver.v_min() > solver.v_max() {
                return Err(Fail);
            }
        }
        if !changed {
            return Ok(());
        }
    }
}
