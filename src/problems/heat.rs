//! Periodic heat equations with spectral Laplacians, in one and two
//! dimensions. Purely implicit: the explicit right-hand side is zero.

use rustfft::num_complex::Complex;

use crate::encap::{Encap, Field};
use crate::fft::{signed_freq, Dft};
use crate::problem::Problem;
use crate::time_error::TimeSieveError;

pub const DEFAULT_DIFFUSIVITY: f64 = 0.02;

const TAU: f64 = 2.0 * std::f64::consts::PI;

fn laplacian_1d(edge: usize) -> Vec<f64> {
    (0..edge)
        .map(|i| {
            let k = TAU * signed_freq(i, edge);
            -k * k
        })
        .collect()
}

fn laplacian_2d(edge: usize) -> Vec<f64> {
    (0..edge * edge)
        .map(|i| {
            let kx = TAU * signed_freq(i % edge, edge);
            let ky = TAU * signed_freq(i / edge, edge);
            -(kx * kx + ky * ky)
        })
        .collect()
}

/// Apply `u <- c * lap * u` in frequency space; `c` carries the inverse-DFT
/// normalization.
fn apply_spectral<const D: usize>(
    dft: &mut Dft,
    u: &Field<D>,
    weights: impl Fn(usize, Complex<f64>) -> Complex<f64>,
) -> Field<D> {
    let mut z = dft.forward(u);
    for (i, v) in z.iter_mut().enumerate() {
        *v = weights(i, *v);
    }
    let mut out = Field::<D>::new(u.edge());
    dft.backward(&mut z, &mut out);
    out
}

/// 1D heat equation `u_t = nu u_xx` on the periodic unit interval.
pub struct Heat1d {
    edge: usize,
    nu: f64,
    dft: Dft,
    lap: Vec<f64>,
}

impl Heat1d {
    pub fn new(edge: usize, nu: f64) -> Self {
        Heat1d {
            edge,
            nu,
            dft: Dft::new(),
            lap: laplacian_1d(edge),
        }
    }

    pub fn nu(&self) -> f64 {
        self.nu
    }
}

impl Problem for Heat1d {
    type State = Field<1>;

    fn dofs(&self) -> usize {
        self.edge
    }

    fn new_state(&self) -> Field<1> {
        Field::new(self.edge)
    }

    fn exact(&self, t: f64) -> Field<1> {
        let mut u = self.new_state();
        let edge = self.edge as f64;
        let decay = (-t * TAU * TAU * self.nu).exp();
        u.fill_with(|i| (TAU * i[0] as f64 / edge).sin() * decay);
        u
    }

    fn eval_expl(&mut self, _t: f64, _u: &Field<1>) -> Field<1> {
        Field::new(self.edge)
    }

    fn eval_impl(&mut self, _t: f64, u: &Field<1>) -> Field<1> {
        let c = self.nu / self.dofs() as f64;
        let lap = &self.lap;
        apply_spectral(&mut self.dft, u, |i, z| z * (c * lap[i]))
    }

    fn solve_impl(
        &mut self,
        _t: f64,
        dt: f64,
        rhs: &Field<1>,
    ) -> Result<(Field<1>, Field<1>), TimeSieveError> {
        let n = self.dofs() as f64;
        let c = self.nu * dt;
        let lap = &self.lap;
        let u = apply_spectral(&mut self.dft, rhs, |i, z| z / ((1.0 - c * lap[i]) * n));
        let mut f = u.clone();
        f.axpy(-1.0, rhs);
        for v in f.as_mut_slice() {
            *v /= dt;
        }
        Ok((u, f))
    }
}

/// 2D heat equation on the periodic unit square.
pub struct Heat2d {
    edge: usize,
    nu: f64,
    dft: Dft,
    lap: Vec<f64>,
}

impl Heat2d {
    pub fn new(edge: usize, nu: f64) -> Self {
        Heat2d {
            edge,
            nu,
            dft: Dft::new(),
            lap: laplacian_2d(edge),
        }
    }
}

impl Problem for Heat2d {
    type State = Field<2>;

    fn dofs(&self) -> usize {
        self.edge * self.edge
    }

    fn new_state(&self) -> Field<2> {
        Field::new(self.edge)
    }

    fn exact(&self, t: f64) -> Field<2> {
        let mut u = self.new_state();
        let edge = self.edge as f64;
        let decay = (-t * TAU * TAU * self.nu).exp();
        u.fill_with(|i| {
            ((TAU * i[0] as f64 / edge).sin() + (TAU * i[1] as f64 / edge).sin()) * decay
        });
        u
    }

    fn eval_expl(&mut self, _t: f64, _u: &Field<2>) -> Field<2> {
        Field::new(self.edge)
    }

    fn eval_impl(&mut self, _t: f64, u: &Field<2>) -> Field<2> {
        let c = self.nu / self.dofs() as f64;
        let lap = &self.lap;
        apply_spectral(&mut self.dft, u, |i, z| z * (c * lap[i]))
    }

    fn solve_impl(
        &mut self,
        _t: f64,
        dt: f64,
        rhs: &Field<2>,
    ) -> Result<(Field<2>, Field<2>), TimeSieveError> {
        let n = self.dofs() as f64;
        let c = self.nu * dt;
        let lap = &self.lap;
        let u = apply_spectral(&mut self.dft, rhs, |i, z| z / ((1.0 - c * lap[i]) * n));
        let mut f = u.clone();
        f.axpy(-1.0, rhs);
        for v in f.as_mut_slice() {
            *v /= dt;
        }
        Ok((u, f))
    }
}
