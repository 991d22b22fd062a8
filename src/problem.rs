//! The contract a problem module provides to the IMEX sweeper engine.
//!
//! The right-hand side is split `u' = f_E(t, u) + f_I(t, u)`; the explicit
//! part is sampled directly, the implicit part enters through a backward-Euler
//! style solve. Problems also act as the factory for their own state vectors,
//! which keeps every state a sweeper owns sized for its level.

use crate::encap::Encap;
use crate::time_error::TimeSieveError;

/// Capability set of a PDE/ODE problem module.
pub trait Problem: Send {
    /// The encapsulated spatial state this problem operates on.
    type State: Encap;

    /// Total spatial degrees of freedom.
    fn dofs(&self) -> usize;

    /// A fresh zeroed state of the right size.
    fn new_state(&self) -> Self::State;

    /// Analytic solution at `t`; for testing and diagnostics only.
    fn exact(&self, t: f64) -> Self::State;

    /// Initial value at `t0`. Defaults to the analytic solution.
    fn initial(&self, t0: f64) -> Self::State {
        self.exact(t0)
    }

    /// Sample the explicit part `f_E(t, u)`.
    fn eval_expl(&mut self, t: f64, u: &Self::State) -> Self::State;

    /// Sample the implicit part `f_I(t, u)`.
    fn eval_impl(&mut self, t: f64, u: &Self::State) -> Self::State;

    /// Solve `u - dt * f_I(t, u) = rhs` and return `(u, f_I(t, u))`.
    ///
    /// The returned `f` must be the implicit right-hand side at the returned
    /// `u`, so the sweeper can reuse it without a second evaluation.
    fn solve_impl(
        &mut self,
        t: f64,
        dt: f64,
        rhs: &Self::State,
    ) -> Result<(Self::State, Self::State), TimeSieveError>;
}
