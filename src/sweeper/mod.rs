//! Sweepers: iterative correctors that own the per-step state at the
//! collocation nodes of one level.
//!
//! [`Sweeper`] is the capability set controllers and transfer operators
//! program against; [`imex::ImexSweeper`] is the concrete engine for
//! implicit-explicit splittings. A sweeper owns `M + 1` state slots per
//! array (index 0 is the left interval boundary, indices 1..=M the
//! collocation nodes), snapshots of the previous iterate, right-hand-side
//! samples, FAS corrections and residuals.

pub mod imex;

pub use imex::ImexSweeper;

use crate::encap::Encap;
use crate::quadrature::Quadrature;
use crate::status::Status;
use crate::time_error::TimeSieveError;

/// Capability set of a per-level sweeper.
///
/// Array accessors expose the augmented node layout described in the module
/// docs; all slices have length `M + 1` after [`Sweeper::setup`].
pub trait Sweeper: Send {
    type State: Encap;

    /// Attach the collocation rule. Must happen before `setup`.
    fn set_quadrature(&mut self, q: Quadrature);
    fn quadrature(&self) -> Option<&Quadrature>;

    fn status(&self) -> &Status;
    fn status_mut(&mut self) -> &mut Status;

    /// Allocate the per-node state arrays. Requires a quadrature.
    fn setup(&mut self) -> Result<(), TimeSieveError>;

    /// A fresh zeroed state sized for this level.
    fn new_state(&self) -> Self::State;

    fn states(&self) -> &[Self::State];
    fn states_mut(&mut self) -> &mut [Self::State];
    fn previous_states(&self) -> &[Self::State];
    fn tau(&self) -> &[Self::State];
    fn tau_mut(&mut self) -> &mut [Self::State];
    fn residuals(&self) -> &[Self::State];

    /// The value at the left interval boundary.
    fn initial_state(&self) -> Result<&Self::State, TimeSieveError>;
    /// Overwrite the value at the left interval boundary.
    fn set_initial_state(&mut self, u: &Self::State) -> Result<(), TimeSieveError>;
    /// The value at the right interval boundary, as of the last predict or
    /// sweep.
    fn end_state(&self) -> Result<&Self::State, TimeSieveError>;

    /// Copy the initial state into every node slot.
    fn spread(&mut self) -> Result<(), TimeSieveError>;
    /// Snapshot the current states into the previous-iterate slots.
    fn save(&mut self);
    /// Resample the right-hand sides at the current states; with
    /// `initial_only` just at the left boundary.
    fn reevaluate(&mut self, initial_only: bool) -> Result<(), TimeSieveError>;

    /// Produce an initial guess at all nodes from the initial state.
    fn predict(&mut self) -> Result<(), TimeSieveError>;
    /// One correction pass over the nodes.
    fn sweep(&mut self) -> Result<(), TimeSieveError>;

    /// Recompute the per-node residuals; with `only_last` just the final
    /// node (cheap screening).
    fn compute_residuals(&mut self, only_last: bool) -> Result<(), TimeSieveError>;
    /// Residual-based convergence decision. `pre_check` screens with only
    /// the last node's residual and does not touch the status record.
    fn converged(&mut self, pre_check: bool) -> Result<bool, TimeSieveError>;

    /// Update the end state from the node values, integrating with the
    /// end-interval weights when the right boundary is not a node.
    fn integrate_end_state(&mut self, dt: f64) -> Result<(), TimeSieveError>;
    /// Shift the end state into the initial slot for the next step.
    fn advance(&mut self) -> Result<(), TimeSieveError>;

    /// Cumulative node integrals `dt * sum_j q_mat[m][j] (f_E[j] + f_I[j])`,
    /// length `M + 1` with a zero in slot 0. Consumed by FAS corrections.
    fn rhs_integrals(&self, dt: f64) -> Result<Vec<Self::State>, TimeSieveError>;

    /// End-of-step diagnostics hook.
    fn post_step(&mut self) {}
}
