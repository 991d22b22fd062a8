//! 1D advection-diffusion on the periodic unit interval, split IMEX:
//! advection is sampled explicitly, diffusion is solved implicitly.

use rustfft::num_complex::Complex;

use crate::encap::{Encap, Field};
use crate::fft::{signed_freq, Dft};
use crate::problem::Problem;
use crate::time_error::TimeSieveError;

pub const DEFAULT_DIFFUSIVITY: f64 = 0.02;
pub const DEFAULT_VELOCITY: f64 = 1.0;

const TAU: f64 = 2.0 * std::f64::consts::PI;

/// `u_t + v u_x = nu u_xx` with transport speed `v` and diffusivity `nu`.
pub struct AdvecDiff1d {
    edge: usize,
    nu: f64,
    v: f64,
    dft: Dft,
    ddx: Vec<Complex<f64>>,
    lap: Vec<f64>,
}

impl AdvecDiff1d {
    pub fn new(edge: usize, nu: f64, v: f64) -> Self {
        let ddx = (0..edge)
            .map(|i| Complex::new(0.0, TAU * signed_freq(i, edge)))
            .collect();
        let lap = (0..edge)
            .map(|i| {
                let k = TAU * signed_freq(i, edge);
                -k * k
            })
            .collect();
        AdvecDiff1d {
            edge,
            nu,
            v,
            dft: Dft::new(),
            ddx,
            lap,
        }
    }
}

impl Problem for AdvecDiff1d {
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
        let shift = self.v * t;
        u.fill_with(|i| (TAU * (i[0] as f64 / edge - shift)).sin() * decay);
        u
    }

    fn eval_expl(&mut self, _t: f64, u: &Field<1>) -> Field<1> {
        let scale = -self.v / self.dofs() as f64;
        let mut z = self.dft.forward(u);
        for (zi, d) in z.iter_mut().zip(&self.ddx) {
            *zi = *zi * d * scale;
        }
        let mut out = self.new_state();
        self.dft.backward(&mut z, &mut out);
        out
    }

    fn eval_impl(&mut self, _t: f64, u: &Field<1>) -> Field<1> {
        let c = self.nu / self.dofs() as f64;
        let mut z = self.dft.forward(u);
        for (zi, l) in z.iter_mut().zip(&self.lap) {
            *zi = *zi * (c * l);
        }
        let mut out = self.new_state();
        self.dft.backward(&mut z, &mut out);
        out
    }

    fn solve_impl(
        &mut self,
        _t: f64,
        dt: f64,
        rhs: &Field<1>,
    ) -> Result<(Field<1>, Field<1>), TimeSieveError> {
        let n = self.dofs() as f64;
        let c = self.nu * dt;
        let mut z = self.dft.forward(rhs);
        for (zi, l) in z.iter_mut().zip(&self.lap) {
            *zi = *zi / ((1.0 - c * l) * n);
        }
        let mut u = self.new_state();
        self.dft.backward(&mut z, &mut u);
        let mut f = u.clone();
        f.axpy(-1.0, rhs);
        for v in f.as_mut_slice() {
            *v /= dt;
        }
        Ok((u, f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advection_of_a_sine_is_a_cosine() {
        let mut p = AdvecDiff1d::new(64, 0.0, 1.0);
        let u = p.exact(0.0);
        let f = p.eval_expl(0.0, &u);
        // -v d/dx sin(2 pi x) = -2 pi cos(2 pi x)
        let mut expect = Field::<1>::new(64);
        expect.fill_with(|i| -TAU * (TAU * i[0] as f64 / 64.0).cos());
        let mut diff = f.clone();
        diff.axpy(-1.0, &expect);
        assert!(diff.norm_inf() < 1e-10);
    }

    #[test]
    fn exact_is_a_traveling_decaying_wave() {
        let p = AdvecDiff1d::new(64, 0.02, 1.0);
        // After one full period the profile returns, scaled by the decay.
        let u0 = p.exact(0.0);
        let u1 = p.exact(1.0);
        let decay = (-TAU * TAU * 0.02f64).exp();
        let mut expect = u0.clone();
        for v in expect.as_mut_slice() {
            *v *= decay;
        }
        let mut diff = u1.clone();
        diff.axpy(-1.0, &expect);
        assert!(diff.norm_inf() < 1e-12);
    }
}
