//! Bundled problem modules: small PDE/ODE right-hand sides with analytic
//! solutions, used by the integration tests and as worked examples of the
//! [`Problem`](crate::problem::Problem) contract.

pub mod advec_diff;
pub mod heat;
pub mod vanderpol;

pub use advec_diff::AdvecDiff1d;
pub use heat::{Heat1d, Heat2d};
pub use vanderpol::VanDerPol;

use crate::encap::Encap;
use crate::problem::Problem;

/// Per-node differences to the analytic solution at `t + dt * nodes[m]`;
/// diagnostic only.
pub fn compute_error<P: Problem>(
    problem: &P,
    states: &[P::State],
    node_times: &[f64],
) -> Vec<P::State> {
    states
        .iter()
        .zip(node_times)
        .map(|(u, &t)| {
            let mut e = u.clone();
            e.axpy(-1.0, &problem.exact(t));
            e
        })
        .collect()
}

/// Errors scaled by the state norms; diagnostic only.
pub fn compute_relative_error<P: Problem>(errors: &[P::State], states: &[P::State]) -> Vec<f64> {
    errors
        .iter()
        .zip(states)
        .map(|(e, u)| e.norm_inf() / u.norm_inf())
        .collect()
}
