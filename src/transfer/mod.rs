//! Inter-level transfer: polynomial interpolation/restriction in time,
//! pluggable data transfer in space, and the FAS correction coupling a
//! coarse level to the fine one above it.
//!
//! [`Transfer`] is the seam the controllers drive; every method defaults to
//! [`TimeSieveError::NotImplemented`] so a concrete operator only overrides
//! what its spaces support. [`spectral::SpectralTransfer`] is the bundled
//! implementation for periodic cube grids.

pub mod spectral;

pub use spectral::SpectralTransfer;

use crate::quadrature::Quadrature;
use crate::sweeper::Sweeper;
use crate::time_error::TimeSieveError;

/// Transfer operator between a fine and a coarse sweeper. Transfers never
/// own sweepers; they operate on the states handed in.
pub trait Transfer<S: Sweeper>: Send {
    /// Move only the left-boundary value coarse -> fine.
    fn interpolate_initial(&mut self, _coarse: &S, _fine: &mut S) -> Result<(), TimeSieveError> {
        Err(TimeSieveError::NotImplemented(
            "interpolation of initial value for generic sweeper",
        ))
    }

    /// Move the coarse correction at all nodes onto the fine level; with
    /// `initial` also the left-boundary value.
    fn interpolate(
        &mut self,
        _coarse: &S,
        _fine: &mut S,
        _initial: bool,
    ) -> Result<(), TimeSieveError> {
        Err(TimeSieveError::NotImplemented(
            "interpolation for generic sweeper",
        ))
    }

    /// Move only the left-boundary value fine -> coarse.
    fn restrict_initial(&mut self, _fine: &S, _coarse: &mut S) -> Result<(), TimeSieveError> {
        Err(TimeSieveError::NotImplemented(
            "restriction of initial value for generic sweeper",
        ))
    }

    /// Restrict the fine node values onto the coarse level; with `initial`
    /// also the left-boundary value.
    fn restrict(&mut self, _fine: &S, _coarse: &mut S, _initial: bool) -> Result<(), TimeSieveError> {
        Err(TimeSieveError::NotImplemented(
            "restriction for generic sweeper",
        ))
    }

    /// Write the FAS correction `tau = R(I_fine) - I_coarse` into the coarse
    /// sweeper.
    fn fas(&mut self, _dt: f64, _fine: &S, _coarse: &mut S) -> Result<(), TimeSieveError> {
        Err(TimeSieveError::NotImplemented(
            "FAS correction for generic sweeper",
        ))
    }
}

/// Lagrange matrix mapping coarse state arrays (length `Mc + 1`) onto fine
/// ones (length `Mf + 1`). Returns `None` when both levels use the same
/// nodes and the transfer is the identity.
pub fn time_interp_matrix(coarse: &Quadrature, fine: &Quadrature) -> Option<Vec<Vec<f64>>> {
    let c_aug = coarse.augmented_nodes();
    let f_aug = fine.augmented_nodes();
    if c_aug.len() == f_aug.len()
        && c_aug
            .iter()
            .zip(&f_aug)
            .all(|(a, b)| (a - b).abs() < 1e-12)
    {
        return None;
    }

    let (basis, offset) = coarse.basis_points();
    let mut mat = vec![vec![0.0; c_aug.len()]; f_aug.len()];
    for (row, &t) in mat.iter_mut().zip(&f_aug) {
        for (jb, _) in basis.iter().enumerate() {
            row[jb + offset] = crate::quadrature::polynomial::lagrange_eval(&basis, jb, t);
        }
    }
    Some(mat)
}

/// State-array index on the fine level for each coarse state index, for
/// node-wise injection. Requires the coarse nodes to be nested in the fine
/// ones.
pub fn node_map(fine: &Quadrature, coarse: &Quadrature) -> Result<Vec<usize>, TimeSieveError> {
    let f_nodes = fine.nodes();
    let c_nodes = coarse.nodes();
    let stride = if f_nodes.len() == c_nodes.len() {
        1
    } else {
        if c_nodes.len() < 2 || (f_nodes.len() - 1) % (c_nodes.len() - 1) != 0 {
            return Err(TimeSieveError::InvalidGeometry(format!(
                "cannot inject {} fine nodes onto {} coarse nodes",
                f_nodes.len(),
                c_nodes.len()
            )));
        }
        (f_nodes.len() - 1) / (c_nodes.len() - 1)
    };
    let mut map = Vec::with_capacity(c_nodes.len() + 1);
    map.push(0);
    for (i, &cn) in c_nodes.iter().enumerate() {
        let j = i * stride;
        if (f_nodes[j] - cn).abs() > 1e-10 {
            return Err(TimeSieveError::InvalidGeometry(
                "quadrature nodes of fine and coarse level are not nested".to_string(),
            ));
        }
        map.push(j + 1);
    }
    Ok(map)
}
