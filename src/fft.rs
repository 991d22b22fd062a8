//! DFT workspace for cube-shaped real data.
//!
//! Wraps `rustfft` with plan caching and axis-by-axis transforms so the same
//! helper serves 1D lines, 2D squares and 3D cubes. Transforms are
//! unnormalized in both directions (the usual FFTW convention); callers fold
//! the `1/N` factor into whatever scaling they apply in frequency space.
//! Buffers returned by [`Dft::forward`] are plain vectors owned by the
//! caller; the plan cache is the only state retained between calls.

use std::collections::HashMap;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::encap::{Encap, Field};

/// Signed frequency index for mode `i` on a periodic grid of `n` points.
#[inline]
pub fn signed_freq(i: usize, n: usize) -> f64 {
    if i <= n / 2 {
        i as f64
    } else {
        i as f64 - n as f64
    }
}

/// Plan cache plus scratch for repeated transforms of cube-shaped data.
pub struct Dft {
    planner: FftPlanner<f64>,
    plans: HashMap<(usize, bool), Arc<dyn Fft<f64>>>,
}

impl Dft {
    pub fn new() -> Self {
        Dft {
            planner: FftPlanner::new(),
            plans: HashMap::new(),
        }
    }

    fn plan(&mut self, n: usize, inverse: bool) -> Arc<dyn Fft<f64>> {
        let planner = &mut self.planner;
        self.plans
            .entry((n, inverse))
            .or_insert_with(|| {
                if inverse {
                    planner.plan_fft_inverse(n)
                } else {
                    planner.plan_fft_forward(n)
                }
            })
            .clone()
    }

    /// Unnormalized forward transform of a `D`-dimensional field.
    pub fn forward<const D: usize>(&mut self, field: &Field<D>) -> Vec<Complex<f64>> {
        let mut z: Vec<Complex<f64>> = field
            .as_slice()
            .iter()
            .map(|&v| Complex::new(v, 0.0))
            .collect();
        for axis in 0..D {
            self.axis_transform(&mut z, field.edge(), D, axis, false);
        }
        z
    }

    /// Unnormalized inverse transform; the real parts land in `out`.
    pub fn backward<const D: usize>(&mut self, z: &mut [Complex<f64>], out: &mut Field<D>) {
        let edge = out.edge();
        debug_assert_eq!(z.len(), out.dofs());
        for axis in 0..D {
            self.axis_transform(z, edge, D, axis, true);
        }
        for (o, v) in out.as_mut_slice().iter_mut().zip(z.iter()) {
            *o = v.re;
        }
    }

    fn axis_transform(
        &mut self,
        data: &mut [Complex<f64>],
        edge: usize,
        dims: usize,
        axis: usize,
        inverse: bool,
    ) {
        let fft = self.plan(edge, inverse);
        let stride = edge.pow(axis as u32);
        let lines = data.len() / edge;
        let mut line = vec![Complex::new(0.0, 0.0); edge];
        for o in 0..lines {
            // Decompose the line counter into the non-axis coordinates.
            let mut rem = o;
            let mut base = 0;
            let mut mul = 1;
            for d in 0..dims {
                if d == axis {
                    mul *= edge;
                    continue;
                }
                base += (rem % edge) * mul;
                rem /= edge;
                mul *= edge;
            }
            for (k, l) in line.iter_mut().enumerate() {
                *l = data[base + k * stride];
            }
            fft.process(&mut line);
            for (k, l) in line.iter().enumerate() {
                data[base + k * stride] = *l;
            }
        }
    }
}

impl Default for Dft {
    fn default() -> Self {
        Self::new()
    }
}
