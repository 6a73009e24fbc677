use crate::propagator::fixpoint;
use crate::propagator::Propagator;
use crate::solver::Fail;
use crate::solver::Solver;

/// A single binary choice: `observation := cluster` on one side, `cluster`
/// excluded from `observation`'s domain on the other. Spec §6's branching
/// strategy picks `(var, val)`; this engine only needs to explore both
/// halves and report whether either survived.
#[derive(Debug, Clone, Copy)]
pub struct Branch {
    pub var: usize,
    pub val: usize,
}

/// Chooses the next branching decision, or reports that the node is a leaf
/// (every domain singleton) by returning `None`.
pub trait Brancher {
    fn branch(&mut self, solver: &Solver) -> Option<Branch>;
}

/// Explores the whole search tree under `solver`'s current domains,
/// maintaining `V.max` as a branch-and-bound incumbent rather than
/// stopping at the first solution — this is an exact solver, so every leaf
/// not pruned by a propagator's bound check must be visited.
///
/// `on_solution` is called at every leaf; it is expected to compute the
/// actual objective from the full assignment and call
/// [`Solver::record_incumbent`] itself; the engine has no notion of
/// distances or cluster centroids.
///
/// Returns `Err(Fail)` if the whole subtree rooted at `solver`'s current
/// state is infeasible, `Ok(())` otherwise. The caller is responsible for
/// checkpointing before the call and backtracking after it if it wants to
/// keep exploring sibling branches.
pub fn explore(
    solver: &mut Solver,
    propagators: &mut [Box<dyn Propagator>],
    brancher: &mut dyn Brancher,
    on_solution: &mut dyn FnMut(&mut Solver),
) -> Result<(), Fail> {
    fixpoint(solver, propagators)?;
    solver.count_node();

    match brancher.branch(solver) {
        None => {
            on_solution(solver);
            Ok(())
        }
        Some(Branch { var, val }) => {
            solver.checkpoint();
            let left = solver
                .assign(var, val)
                .and_then(|_| explore(solver, propagators, brancher, on_solution));
            solver.backtrack();

            solver.checkpoint();
            let right = solver
                .remove_value(var, val)
                .and_then(|_| explore(solver, propagators, brancher, on_solution));
            solver.backtrack();

            if left.is_err() && right.is_err() {
                Err(Fail)
            } else {
                Ok(())
            }
        }
    }
}

/// Runs [`explore`] from the solver's current state (typically right after
/// construction) and discards the top-level feasibility result: whether
/// the whole instance is unsatisfiable is only interesting to report via
/// "no solution was ever seen by `on_solution`", which the caller already
/// observes through its own accumulator.
pub fn search(
    solver: &mut Solver,
    propagators: &mut [Box<dyn Propagator>],
    brancher: &mut dyn Brancher,
    on_solution: &mut dyn FnMut(&mut Solver),
) {
    let _ = explore(solver, propagators, brancher, on_solution);
}
