//! Spectral transfer on periodic cube grids: zero-padded interpolation in
//! frequency space, stride injection in physical space.
//!
//! Interpolation keeps every coarse frequency at its signed index (positive
//! frequencies stay in the low half, negative ones shift to the top) and
//! zeroes the inserted center band. The per-dimension Nyquist mode has no
//! counterpart with a definite sign on the fine grid and is dropped.

use rustfft::num_complex::Complex;

use crate::encap::{Encap, Field};
use crate::fft::Dft;
use crate::sweeper::Sweeper;
use crate::time_error::TimeSieveError;
use crate::transfer::{node_map, time_interp_matrix, Transfer};

/// Transfer operator for [`Field<D>`] levels: polynomial in time, spectral
/// interpolation / injection restriction in space. Owns its FFT workspace;
/// callers may not retain spectral buffers across calls.
///
/// Restriction snapshots the coarse states it writes; interpolation measures
/// the coarse correction against that snapshot, so it survives however many
/// coarse sweeps and deeper-level corrections happen in between.
pub struct SpectralTransfer<const D: usize> {
    dft: Dft,
    reference: Vec<Field<D>>,
}

impl<const D: usize> SpectralTransfer<D> {
    pub fn new() -> Self {
        SpectralTransfer {
            dft: Dft::new(),
            reference: Vec::new(),
        }
    }

    /// Spectral interpolation of a single field onto a finer grid.
    pub fn interpolate_field(
        &mut self,
        coarse: &Field<D>,
        fine: &mut Field<D>,
    ) -> Result<(), TimeSieveError> {
        let nc = coarse.edge();
        let nf = fine.edge();
        if nc == nf {
            fine.copy_from(coarse);
            return Ok(());
        }
        if nf < nc || nf % nc != 0 {
            return Err(TimeSieveError::InvalidGeometry(format!(
                "fine edge {nf} is not a multiple of coarse edge {nc}"
            )));
        }
        let factor = nf / nc;
        if D >= 2 && factor != 2 {
            return Err(TimeSieveError::UnsupportedCoarsening { dim: D, factor });
        }
        if nc % 2 != 0 {
            return Err(TimeSieveError::InvalidGeometry(format!(
                "spectral interpolation requires an even coarse edge, got {nc}"
            )));
        }

        let coarse_z = self.dft.forward(coarse);
        let mut fine_z = vec![Complex::new(0.0, 0.0); fine.dofs()];
        // The forward transform is unnormalized.
        let scale = 1.0 / coarse.dofs() as f64;

        'modes: for (ci, &val) in coarse_z.iter().enumerate() {
            let mut rem = ci;
            let mut fidx = 0;
            let mut mul = 1;
            for _ in 0..D {
                let c = rem % nc;
                rem /= nc;
                let f = if c < nc / 2 {
                    c
                } else if c == nc / 2 {
                    continue 'modes;
                } else {
                    c + nf - nc
                };
                fidx += f * mul;
                mul *= nf;
            }
            fine_z[fidx] = val * scale;
        }

        self.dft.backward(&mut fine_z, fine);
        Ok(())
    }

    /// Injection restriction of a single field onto a coarser grid.
    pub fn restrict_field(
        &mut self,
        fine: &Field<D>,
        coarse: &mut Field<D>,
    ) -> Result<(), TimeSieveError> {
        let nc = coarse.edge();
        let nf = fine.edge();
        if nc == nf {
            coarse.copy_from(fine);
            return Ok(());
        }
        if nf < nc || nf % nc != 0 {
            return Err(TimeSieveError::InvalidGeometry(format!(
                "fine edge {nf} is not a multiple of coarse edge {nc}"
            )));
        }
        let factor = nf / nc;
        let fine_data = fine.as_slice();
        for (ci, out) in coarse.as_mut_slice().iter_mut().enumerate() {
            let mut rem = ci;
            let mut fidx = 0;
            let mut mul = 1;
            for _ in 0..D {
                let c = rem % nc;
                rem /= nc;
                fidx += factor * c * mul;
                mul *= nf;
            }
            *out = fine_data[fidx];
        }
        Ok(())
    }
}

impl<const D: usize> Default for SpectralTransfer<D> {
    fn default() -> Self {
        Self::new()
    }
}

fn quad_of<S: Sweeper>(s: &S) -> Result<&crate::quadrature::Quadrature, TimeSieveError> {
    s.quadrature()
        .ok_or(TimeSieveError::SetupIncomplete("quadrature not attached"))
}

impl<const D: usize, S> Transfer<S> for SpectralTransfer<D>
where
    S: Sweeper<State = Field<D>>,
{
    fn interpolate_initial(&mut self, coarse: &S, fine: &mut S) -> Result<(), TimeSieveError> {
        // Correct the fine boundary value by the interpolated difference to
        // the coarse one, so matching data stays untouched.
        let mut delta = coarse.states()[0].clone();
        let mut restricted = coarse.new_state();
        self.restrict_field(&fine.states()[0], &mut restricted)?;
        delta.axpy(-1.0, &restricted);

        let mut correction = fine.new_state();
        self.interpolate_field(&delta, &mut correction)?;
        fine.states_mut()[0].axpy(1.0, &correction);
        fine.reevaluate(true)
    }

    fn interpolate(&mut self, coarse: &S, fine: &mut S, initial: bool) -> Result<(), TimeSieveError> {
        if initial {
            self.interpolate_initial(coarse, fine)?;
        }

        // Coarse correction accumulated since the last restriction; before
        // any restriction fall back to the previous-iterate snapshot.
        let baseline: &[Field<D>] = if self.reference.len() == coarse.states().len() {
            &self.reference
        } else {
            coarse.previous_states()
        };
        let deltas: Vec<Field<D>> = coarse
            .states()
            .iter()
            .zip(baseline)
            .map(|(s, p)| {
                let mut d = s.clone();
                d.axpy(-1.0, p);
                d
            })
            .collect();

        let time_deltas: Vec<Field<D>> = match time_interp_matrix(quad_of(coarse)?, quad_of(fine)?)
        {
            None => deltas,
            Some(mat) => mat
                .iter()
                .map(|row| {
                    let mut acc = coarse.new_state();
                    for (w, d) in row.iter().zip(&deltas) {
                        if *w != 0.0 {
                            acc.axpy(*w, d);
                        }
                    }
                    acc
                })
                .collect(),
        };

        // The boundary value is owned by interpolate_initial; node
        // corrections start at the first collocation node.
        for (m, delta) in time_deltas.iter().enumerate().skip(1) {
            let mut correction = fine.new_state();
            self.interpolate_field(delta, &mut correction)?;
            fine.states_mut()[m].axpy(1.0, &correction);
        }
        fine.reevaluate(false)
    }

    fn restrict_initial(&mut self, fine: &S, coarse: &mut S) -> Result<(), TimeSieveError> {
        let mut restricted = coarse.new_state();
        self.restrict_field(&fine.states()[0], &mut restricted)?;
        coarse.states_mut()[0].copy_from(&restricted);
        coarse.reevaluate(true)
    }

    fn restrict(&mut self, fine: &S, coarse: &mut S, initial: bool) -> Result<(), TimeSieveError> {
        let map = node_map(quad_of(fine)?, quad_of(coarse)?)?;
        let start = if initial { 0 } else { 1 };
        for (mc, &mf) in map.iter().enumerate().skip(start) {
            let mut restricted = coarse.new_state();
            self.restrict_field(&fine.states()[mf], &mut restricted)?;
            coarse.states_mut()[mc].copy_from(&restricted);
        }
        self.reference = coarse.states().to_vec();
        coarse.reevaluate(false)
    }

    fn fas(&mut self, dt: f64, fine: &S, coarse: &mut S) -> Result<(), TimeSieveError> {
        let map = node_map(quad_of(fine)?, quad_of(coarse)?)?;
        let fine_int = fine.rhs_integrals(dt)?;
        let coarse_int = coarse.rhs_integrals(dt)?;
        let fine_tau = fine.tau();

        for (mc, &mf) in map.iter().enumerate().skip(1) {
            // Any fine-level correction rides along so deeper hierarchies
            // see the full restricted residual.
            let mut src = fine_int[mf].clone();
            src.axpy(1.0, &fine_tau[mf]);
            let mut tau = coarse.new_state();
            self.restrict_field(&src, &mut tau)?;
            tau.axpy(-1.0, &coarse_int[mc]);
            coarse.tau_mut()[mc].copy_from(&tau);
        }
        coarse.tau_mut()[0].zero();
        Ok(())
    }
}
