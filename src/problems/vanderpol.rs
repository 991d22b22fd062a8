//! The van der Pol oscillator, treated fully implicitly.
//!
//! With `nu = 0` the system degenerates to the linear oscillator
//! `x' = y, y' = -x`, whose trigonometric solution makes it the standard
//! convergence-order fixture.

use crate::encap::{Encap, Field};
use crate::problem::Problem;
use crate::time_error::TimeSieveError;

const NEWTON_TOL: f64 = 1e-13;
const NEWTON_MAX_ITER: usize = 100;

/// Van der Pol oscillator with damping parameter `nu` and initial position
/// and velocity `(x0, y0)`.
pub struct VanDerPol {
    nu: f64,
    x0: f64,
    y0: f64,
}

impl VanDerPol {
    pub fn new(nu: f64, x0: f64, y0: f64) -> Self {
        VanDerPol { nu, x0, y0 }
    }

    fn rhs(&self, x: f64, y: f64) -> (f64, f64) {
        (y, self.nu * (1.0 - x * x) * y - x)
    }
}

impl Problem for VanDerPol {
    type State = Field<1>;

    fn dofs(&self) -> usize {
        2
    }

    fn new_state(&self) -> Field<1> {
        Field::new(2)
    }

    fn exact(&self, t: f64) -> Field<1> {
        assert!(
            self.nu == 0.0,
            "analytic solution only exists for the undamped oscillator"
        );
        let mut u = self.new_state();
        u.as_mut_slice()[0] = self.x0 * t.cos() + self.y0 * t.sin();
        u.as_mut_slice()[1] = self.y0 * t.cos() - self.x0 * t.sin();
        u
    }

    fn initial(&self, _t0: f64) -> Field<1> {
        let mut u = self.new_state();
        u.as_mut_slice()[0] = self.x0;
        u.as_mut_slice()[1] = self.y0;
        u
    }

    fn eval_expl(&mut self, _t: f64, u: &Field<1>) -> Field<1> {
        let mut f = u.clone();
        f.zero();
        f
    }

    fn eval_impl(&mut self, _t: f64, u: &Field<1>) -> Field<1> {
        let (x, y) = (u.as_slice()[0], u.as_slice()[1]);
        let (fx, fy) = self.rhs(x, y);
        let mut f = self.new_state();
        f.as_mut_slice()[0] = fx;
        f.as_mut_slice()[1] = fy;
        f
    }

    fn solve_impl(
        &mut self,
        t: f64,
        dt: f64,
        rhs: &Field<1>,
    ) -> Result<(Field<1>, Field<1>), TimeSieveError> {
        let (a, b) = (rhs.as_slice()[0], rhs.as_slice()[1]);
        let (mut x, mut y);

        if self.nu == 0.0 {
            // Linear system: (x - dt y, y + dt x) = (a, b).
            let det = 1.0 + dt * dt;
            x = (a + dt * b) / det;
            y = (b - dt * a) / det;
        } else {
            x = a;
            y = b;
            let mut solved = false;
            for _ in 0..NEWTON_MAX_ITER {
                let (fx, fy) = self.rhs(x, y);
                let rx = x - dt * fx - a;
                let ry = y - dt * fy - b;
                if rx.abs().max(ry.abs()) < NEWTON_TOL {
                    solved = true;
                    break;
                }
                let j00 = 1.0;
                let j01 = -dt;
                let j10 = dt * (2.0 * self.nu * x * y + 1.0);
                let j11 = 1.0 - dt * self.nu * (1.0 - x * x);
                let det = j00 * j11 - j01 * j10;
                if det.abs() < f64::EPSILON {
                    return Err(TimeSieveError::ImplicitSolveFailure(format!(
                        "singular Newton system at t = {t}"
                    )));
                }
                x -= (j11 * rx - j01 * ry) / det;
                y -= (j00 * ry - j10 * rx) / det;
            }
            if !solved {
                return Err(TimeSieveError::ImplicitSolveFailure(format!(
                    "Newton iteration stalled at t = {t}"
                )));
            }
        }

        let mut u = self.new_state();
        u.as_mut_slice()[0] = x;
        u.as_mut_slice()[1] = y;
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
    fn solve_satisfies_the_implicit_relation() {
        let mut p = VanDerPol::new(0.0, 1.0, 0.5);
        let mut rhs = p.new_state();
        rhs.as_mut_slice().copy_from_slice(&[0.7, -0.2]);
        let dt = 0.05;
        let (u, f) = p.solve_impl(0.0, dt, &rhs).unwrap();
        // u - dt * f_I(u) == rhs and f is the right-hand side at u
        let fi = p.eval_impl(0.0, &u);
        for i in 0..2 {
            assert!((u.as_slice()[i] - dt * fi.as_slice()[i] - rhs.as_slice()[i]).abs() < 1e-13);
            assert!((f.as_slice()[i] - fi.as_slice()[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn newton_solve_handles_damping() {
        let mut p = VanDerPol::new(1.5, 1.0, 0.5);
        let mut rhs = p.new_state();
        rhs.as_mut_slice().copy_from_slice(&[1.1, 0.4]);
        let dt = 0.02;
        let (u, _) = p.solve_impl(0.0, dt, &rhs).unwrap();
        let fi = p.eval_impl(0.0, &u);
        for i in 0..2 {
            assert!((u.as_slice()[i] - dt * fi.as_slice()[i] - rhs.as_slice()[i]).abs() < 1e-11);
        }
    }

    #[test]
    fn exact_solves_the_oscillator() {
        let p = VanDerPol::new(0.0, 1.0, 0.5);
        let u = p.exact(0.3);
        // d/dt x == y by finite differences
        let h = 1e-6;
        let xdot =
            (p.exact(0.3 + h).as_slice()[0] - p.exact(0.3 - h).as_slice()[0]) / (2.0 * h);
        assert!((xdot - u.as_slice()[1]).abs() < 1e-8);
    }
}
