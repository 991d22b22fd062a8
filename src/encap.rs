//! Encapsulated state vectors: the opaque spatial data the sweepers operate on.
//!
//! A sweeper never looks inside its states beyond the arithmetic defined by
//! [`Encap`]; problem modules and transfer operators access the raw degrees of
//! freedom through the slice views. Transport over a
//! [`Communicator`](crate::comm::Communicator) is a contiguous `f64` array
//! with no header; sender and receiver agree on the DOF count out of band
//! (it is fixed per level).

use crate::comm::Communicator;
use crate::time_error::TimeSieveError;

/// Arithmetic and raw-data contract for a spatial state vector.
pub trait Encap: Clone + Send + 'static {
    /// Set all degrees of freedom to zero.
    fn zero(&mut self);
    /// `self <- self + a * y`.
    fn axpy(&mut self, a: f64, y: &Self);
    /// Overwrite `self` with `y`. Both must have the same DOF count.
    fn copy_from(&mut self, y: &Self);
    /// Maximum absolute degree of freedom.
    fn norm_inf(&self) -> f64;
    /// Total number of degrees of freedom.
    fn dofs(&self) -> usize;
    /// Raw view of the degrees of freedom.
    fn as_slice(&self) -> &[f64];
    /// Mutable raw view of the degrees of freedom.
    fn as_mut_slice(&mut self) -> &mut [f64];
}

/// A flat cube of `f64` values: `edge^D` degrees of freedom on a periodic
/// grid. `D` is the spatial dimension (1, 2 or 3).
///
/// Being constructible only as a cube keeps the spectral transfer's geometry
/// checks confined to coarsening factors.
#[derive(Clone, Debug, PartialEq)]
pub struct Field<const D: usize> {
    edge: usize,
    data: Vec<f64>,
}

impl<const D: usize> Field<D> {
    /// Create a zeroed field with `edge` degrees of freedom per dimension.
    pub fn new(edge: usize) -> Self {
        Field {
            edge,
            data: vec![0.0; edge.pow(D as u32)],
        }
    }

    /// Degrees of freedom per dimension.
    #[inline]
    pub fn edge(&self) -> usize {
        self.edge
    }

    /// Fill the field by evaluating `f` at each grid multi-index.
    ///
    /// The grid point of index `(i_0, .., i_{D-1})` lies at coordinates
    /// `i_d / edge` on the periodic unit cube; `i_0` is the fastest-varying
    /// index.
    pub fn fill_with(&mut self, mut f: impl FnMut(&[usize; D]) -> f64) {
        let edge = self.edge;
        for (flat, v) in self.data.iter_mut().enumerate() {
            let mut idx = [0usize; D];
            let mut rem = flat;
            for slot in idx.iter_mut() {
                *slot = rem % edge;
                rem /= edge;
            }
            *v = f(&idx);
        }
    }
}

impl<const D: usize> Encap for Field<D> {
    fn zero(&mut self) {
        self.data.fill(0.0);
    }

    fn axpy(&mut self, a: f64, y: &Self) {
        debug_assert_eq!(self.data.len(), y.data.len());
        for (s, t) in self.data.iter_mut().zip(y.data.iter()) {
            *s += a * t;
        }
    }

    fn copy_from(&mut self, y: &Self) {
        debug_assert_eq!(self.data.len(), y.data.len());
        self.data.copy_from_slice(&y.data);
    }

    fn norm_inf(&self) -> f64 {
        self.data.iter().fold(0.0, |m, v| m.max(v.abs()))
    }

    #[inline]
    fn dofs(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// Send a state to `dest`, blocking or not.
pub fn send_state<U: Encap, C: Communicator>(
    u: &U,
    comm: &mut C,
    dest: usize,
    tag: u32,
    blocking: bool,
) -> Result<(), TimeSieveError> {
    if blocking {
        comm.send(u.as_slice(), dest, tag)
    } else {
        comm.isend(u.as_slice(), dest, tag)
    }
}

/// Receive a state from `src`, blocking until it arrives.
pub fn recv_state<U: Encap, C: Communicator>(
    u: &mut U,
    comm: &mut C,
    src: usize,
    tag: u32,
) -> Result<(), TimeSieveError> {
    comm.recv(u.as_mut_slice(), src, tag)
}

/// Broadcast a state from `root` to every rank.
pub fn bcast_state<U: Encap, C: Communicator>(
    u: &mut U,
    comm: &mut C,
    root: usize,
) -> Result<(), TimeSieveError> {
    comm.bcast(u.as_mut_slice(), root)
}

/// Check for a matching in-flight message without receiving it.
pub fn probe_state<C: Communicator>(comm: &C, src: usize, tag: u32) -> bool {
    comm.probe(src, tag)
}
