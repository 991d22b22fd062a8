//! Everything that can go wrong across the integration stack, in one enum.
//!
//! Sweepers, transfers, controllers and communicators all return
//! `Result<_, TimeSieveError>` instead of panicking: missing setup,
//! incompatible grids or node sets, failed implicit solves and transport
//! errors surface to the controller, which decides whether a step dies or
//! the whole run does. Hitting the iteration cap is the one non-fatal
//! variant; it travels through status flags rather than aborting anything.

use thiserror::Error;

/// The failure cases of a parallel-in-time run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimeSieveError {
    /// An operation was invoked before `setup()` or before a required
    /// collaborator (quadrature, transfer) was attached.
    #[error("operation requires setup: {0}")]
    SetupIncomplete(&'static str),
    /// A quadrature rule was requested with too few nodes for its variant.
    #[error("quadrature variant needs at least {min} nodes, got {got}")]
    InvalidNodeCount { min: usize, got: usize },
    /// Grid or node geometry does not admit the requested operation.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Spectral transfer between these grids needs an unsupported coarsening
    /// factor (2D/3D interpolation is implemented for factor 2 only).
    #[error("unsupported coarsening factor {factor} for {dim}-dimensional spectral transfer")]
    UnsupportedCoarsening { dim: usize, factor: usize },
    /// The problem module failed to solve its implicit sub-step.
    #[error("implicit solve failed: {0}")]
    ImplicitSolveFailure(String),
    /// The communicator reported a non-success condition.
    #[error("transport failure: {0}")]
    TransportFailure(String),
    /// The iteration hit its cap before meeting a residual tolerance.
    /// Non-fatal: controllers report it via status flags.
    #[error("step did not converge within {max_iterations} iterations (|r| = {abs_res_norm:.3e})")]
    NotConverged {
        max_iterations: usize,
        abs_res_norm: f64,
    },
    /// A default transfer operation was used where a concrete operator
    /// should have been supplied.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}
