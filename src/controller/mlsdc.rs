//! Multi-level SDC: a serial V-cycle per iteration, sweeping on the way
//! down, restricting with FAS corrections, and interpolating the coarse
//! corrections back up.

use crate::controller::{Duration, LevelStack};
use crate::sweeper::Sweeper;
use crate::time_error::TimeSieveError;
use crate::transfer::Transfer;

/// Serial multi-level SDC controller. Levels are added coarsest first.
pub struct MlsdcController<S, T> {
    stack: LevelStack<S, T>,
    duration: Duration,
}

impl<S: Sweeper, T: Transfer<S>> MlsdcController<S, T> {
    pub fn new() -> Self {
        MlsdcController {
            stack: LevelStack::new(),
            duration: Duration::default(),
        }
    }

    /// Append a level above the current finest; every level but the
    /// coarsest needs the transfer coupling it to the one below.
    pub fn add_level(&mut self, sweeper: S, transfer: Option<T>) {
        self.stack.add_level(sweeper, transfer);
    }

    pub fn set_duration(&mut self, t0: f64, t_end: f64, dt: f64, max_iter: usize) {
        self.duration.set(t0, t_end, dt, max_iter);
    }

    pub fn num_levels(&self) -> usize {
        self.stack.num_levels()
    }

    pub fn finest(&self) -> &S {
        self.stack.finest()
    }

    pub fn finest_mut(&mut self) -> &mut S {
        self.stack.finest_mut()
    }

    pub fn level(&self, l: usize) -> &S {
        self.stack.level(l)
    }

    pub fn setup(&mut self) -> Result<(), TimeSieveError> {
        self.stack.setup()?;
        for l in 0..self.stack.num_levels() {
            self.duration.apply_to(self.stack.level_mut(l));
        }
        Ok(())
    }

    /// Integrate `[t0, t_end)` with one V-cycle per iteration.
    pub fn run(&mut self) -> Result<(), TimeSieveError> {
        if self.stack.num_levels() == 0 {
            return Err(TimeSieveError::SetupIncomplete("no levels added"));
        }
        let max_iter = self.duration.max_iter;
        for step in 0..self.duration.num_steps() {
            let t = self.duration.t0 + step as f64 * self.duration.dt;
            for l in 0..self.stack.num_levels() {
                self.stack.level_mut(l).status_mut().begin_step(t);
            }
            let finest = self.stack.finest_mut();
            if step > 0 {
                finest.advance()?;
            }
            finest.spread()?;
            finest.predict()?;

            let mut converged = finest.converged(false)?;
            let mut k = 0;
            while !converged && k < max_iter {
                k += 1;
                for l in 0..self.stack.num_levels() {
                    self.stack.level_mut(l).status_mut().set_iteration(k);
                }
                self.cycle()?;
                converged = self.stack.finest_mut().converged(false)?;
            }
            self.stack.finest_mut().status_mut().set_converged(converged);
            if !converged {
                log::warn!(
                    "step {} at t = {t}: {}",
                    step,
                    TimeSieveError::NotConverged {
                        max_iterations: max_iter,
                        abs_res_norm: self.stack.finest().status().abs_res_norm(),
                    }
                );
            }
            for l in 0..self.stack.num_levels() {
                self.stack.level_mut(l).post_step();
            }
        }
        Ok(())
    }

    /// One V-cycle: sweep-and-restrict down, sweep the coarsest, then
    /// interpolate up, sweeping the intermediate levels.
    fn cycle(&mut self) -> Result<(), TimeSieveError> {
        let dt = self.duration.dt;

        let mut it = self.stack.finest_iter();
        while !it.is_coarsest() {
            self.stack.level_mut(it.current()).sweep()?;
            let (fine, coarse, transfer) = self.stack.pair_mut(it.transfer())?;
            transfer.restrict(fine, coarse, true)?;
            transfer.fas(dt, fine, coarse)?;
            it.down();
        }
        self.stack.level_mut(it.current()).sweep()?;

        while !it.is_finest() {
            it.up();
            let (fine, coarse, transfer) = self.stack.pair_mut(it.transfer())?;
            transfer.interpolate(coarse, fine, false)?;
            if !it.is_finest() {
                self.stack.level_mut(it.current()).sweep()?;
            }
        }
        Ok(())
    }
}

impl<S: Sweeper, T: Transfer<S>> Default for MlsdcController<S, T> {
    fn default() -> Self {
        Self::new()
    }
}
