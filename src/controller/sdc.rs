//! Single-level SDC: predict, then sweep until the residual tolerance or
//! the iteration cap is hit, step by step.

use crate::controller::Duration;
use crate::sweeper::Sweeper;
use crate::time_error::TimeSieveError;

/// Serial single-level SDC controller.
pub struct SdcController<S> {
    sweeper: S,
    duration: Duration,
}

impl<S: Sweeper> SdcController<S> {
    pub fn new(sweeper: S) -> Self {
        SdcController {
            sweeper,
            duration: Duration::default(),
        }
    }

    pub fn set_duration(&mut self, t0: f64, t_end: f64, dt: f64, max_iter: usize) {
        self.duration.set(t0, t_end, dt, max_iter);
    }

    pub fn sweeper(&self) -> &S {
        &self.sweeper
    }

    pub fn sweeper_mut(&mut self) -> &mut S {
        &mut self.sweeper
    }

    /// Allocate the sweeper and seed its status with the duration.
    pub fn setup(&mut self) -> Result<(), TimeSieveError> {
        self.sweeper.setup()?;
        self.duration.apply_to(&mut self.sweeper);
        Ok(())
    }

    /// Integrate `[t0, t_end)`. The initial value must be in place; the end
    /// state of the final step stays readable afterwards.
    pub fn run(&mut self) -> Result<(), TimeSieveError> {
        let max_iter = self.duration.max_iter;
        for step in 0..self.duration.num_steps() {
            let t = self.duration.t0 + step as f64 * self.duration.dt;
            self.sweeper.status_mut().begin_step(t);
            if step > 0 {
                self.sweeper.advance()?;
            }
            self.sweeper.spread()?;
            self.sweeper.predict()?;

            let mut converged = self.sweeper.converged(false)?;
            let mut k = 0;
            while !converged && k < max_iter {
                k += 1;
                self.sweeper.status_mut().set_iteration(k);
                self.sweeper.sweep()?;
                converged = self.sweeper.converged(false)?;
            }
            self.sweeper.status_mut().set_converged(converged);
            if !converged {
                log::warn!(
                    "step {} at t = {t}: {}",
                    step,
                    TimeSieveError::NotConverged {
                        max_iterations: max_iter,
                        abs_res_norm: self.sweeper.status().abs_res_norm(),
                    }
                );
            }
            self.sweeper.post_step();
        }
        Ok(())
    }
}
