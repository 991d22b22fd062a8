//! # time-sieve
//!
//! time-sieve is a modular Rust library for parallel-in-time integration of
//! ODE and PDE systems, designed for scientific computing codes. It implements
//! the spectral-deferred-correction family of iterative integrators: SDC on a
//! single level, MLSDC across a spatial hierarchy, and PFASST across
//! time-parallel processes coupled by point-to-point messages.
//!
//! ## Features
//! - Collocation quadrature (Gauss-Lobatto, Gauss-Legendre, Gauss-Radau,
//!   Clenshaw-Curtis, equidistant) with node-to-node integration matrices
//! - A generic IMEX sweeper engine parameterized over a problem contract
//!   (explicit/implicit right-hand sides plus an implicit solve)
//! - Polynomial-in-time / spectral-in-space transfer operators with full
//!   approximation scheme (FAS) corrections between levels
//! - Pluggable communication backends (serial, in-process threads, MPI) for
//!   the PFASST time pipeline
//! - Bundled problem modules (heat, advection-diffusion, van der Pol) used by
//!   the test suite
//!
//! ## Usage
//! Add `time-sieve` as a dependency in your `Cargo.toml` and enable features
//! as needed:
//!
//! ```toml
//! [dependencies]
//! time-sieve = "0.2"
//! # Optional features:
//! # features = ["mpi-support"]
//! ```
//!
//! A single SDC run couples a problem module, a sweeper, and a controller:
//!
//! ```
//! use time_sieve::prelude::*;
//!
//! let quad = Quadrature::new(QuadKind::GaussLobatto, 3).unwrap();
//! let mut sweeper = ImexSweeper::new(VanDerPol::new(0.0, 1.0, 0.5));
//! sweeper.set_quadrature(quad);
//! sweeper.set_residual_tolerances(1e-10, 0.0);
//! let mut sdc = SdcController::new(sweeper);
//! sdc.set_duration(0.0, 0.5, 0.1, 20);
//! sdc.setup().unwrap();
//! let u0 = sdc.sweeper().problem().initial(0.0);
//! sdc.sweeper_mut().set_initial_state(&u0).unwrap();
//! sdc.run().unwrap();
//! assert!(sdc.sweeper().status().converged());
//! ```

pub mod comm;
pub mod config;
pub mod controller;
pub mod encap;
pub mod fft;
pub mod problem;
pub mod problems;
pub mod quadrature;
pub mod status;
pub mod sweeper;
pub mod time_error;
pub mod transfer;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    #[cfg(feature = "mpi-support")]
    pub use crate::comm::MpiComm;
    pub use crate::comm::{data_tag, status_tag, Communicator, NoComm, ThreadComm, ThreadGroup};
    pub use crate::config::RunConfig;
    pub use crate::controller::{LevelIter, MlsdcController, PfasstController, SdcController};
    pub use crate::encap::{Encap, Field};
    pub use crate::problem::Problem;
    pub use crate::problems::{AdvecDiff1d, Heat1d, Heat2d, VanDerPol};
    pub use crate::quadrature::{QuadKind, Quadrature};
    pub use crate::status::{Status, StatusMsg};
    pub use crate::sweeper::{ImexSweeper, Sweeper};
    pub use crate::time_error::TimeSieveError;
    pub use crate::transfer::{SpectralTransfer, Transfer};
}
