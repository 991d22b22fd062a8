//! PFASST: the MLSDC V-cycle pipelined across time-parallel ranks.
//!
//! Each rank owns one step of a block of `size` consecutive steps. Per
//! iteration the coarse level forms a pipeline: a rank receives its coarse
//! initial value from the left neighbor's previous iteration (blocking),
//! sweeps, and forwards its coarse end state to the right (non-blocking).
//! Status tokens travel strictly left to right; a rank declares convergence
//! only once its own residual passes and its left neighbor has converged,
//! and then forwards its final fine end state before falling silent. All
//! outstanding requests are drained before a block is advanced.

use crate::comm::{data_tag, status_tag, Communicator};
use crate::controller::{Duration, LevelStack};
use crate::encap;
use crate::status::StatusMsg;
use crate::sweeper::Sweeper;
use crate::time_error::TimeSieveError;
use crate::transfer::Transfer;

/// Time-parallel multi-level controller over a point-to-point communicator.
pub struct PfasstController<S, T, C> {
    stack: LevelStack<S, T>,
    comm: C,
    duration: Duration,
}

impl<S, T, C> PfasstController<S, T, C>
where
    S: Sweeper,
    T: Transfer<S>,
    C: Communicator,
{
    pub fn new(comm: C) -> Self {
        PfasstController {
            stack: LevelStack::new(),
            comm,
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

    pub fn comm(&self) -> &C {
        &self.comm
    }

    pub fn finest(&self) -> &S {
        self.stack.finest()
    }

    pub fn finest_mut(&mut self) -> &mut S {
        self.stack.finest_mut()
    }

    pub fn setup(&mut self) -> Result<(), TimeSieveError> {
        self.stack.setup()?;
        for l in 0..self.stack.num_levels() {
            self.duration.apply_to(self.stack.level_mut(l));
        }
        Ok(())
    }

    /// Integrate `[t0, t_end)` with `size` ranks per block of steps. The
    /// total step count must tile evenly across the ranks.
    pub fn run(&mut self) -> Result<(), TimeSieveError> {
        if self.stack.num_levels() == 0 {
            return Err(TimeSieveError::SetupIncomplete("no levels added"));
        }
        let size = self.comm.size();
        let rank = self.comm.rank();
        let total_steps = self.duration.num_steps();
        if total_steps % size != 0 {
            return Err(TimeSieveError::SetupIncomplete(
                "number of time steps must be a multiple of the communicator size",
            ));
        }
        let blocks = total_steps / size;
        for block in 0..blocks {
            self.run_block(block, rank, size)?;
            self.comm.cleanup()?;
            for l in 0..self.stack.num_levels() {
                self.stack.level_mut(l).post_step();
            }
            if block + 1 < blocks {
                // The last rank's fine end state seeds every rank's next step.
                let root = size - 1;
                let mut u = self.stack.finest().end_state()?.clone();
                encap::bcast_state(&mut u, &mut self.comm, root)?;
                self.stack.finest_mut().set_initial_state(&u)?;
            }
        }
        Ok(())
    }

    fn run_block(&mut self, block: usize, rank: usize, size: usize) -> Result<(), TimeSieveError> {
        let num_levels = self.stack.num_levels();
        let finest_level = num_levels - 1;
        let dt = self.duration.dt;
        let max_iter = self.duration.max_iter;
        let t = self.duration.t0 + (block * size + rank) as f64 * dt;

        for l in 0..num_levels {
            self.stack.level_mut(l).status_mut().begin_step(t);
        }
        {
            let finest = self.stack.finest_mut();
            finest.spread()?;
            finest.reevaluate(false)?;
        }

        // Predictor: restrict the spread values down with FAS, predict on
        // the coarsest, and interpolate the result back up.
        let mut it = self.stack.finest_iter();
        while !it.is_coarsest() {
            let (fine, coarse, transfer) = self.stack.pair_mut(it.transfer())?;
            transfer.restrict(fine, coarse, true)?;
            transfer.fas(dt, fine, coarse)?;
            it.down();
        }
        self.stack.level_mut(0).predict()?;
        while !it.is_finest() {
            it.up();
            let (fine, coarse, transfer) = self.stack.pair_mut(it.transfer())?;
            transfer.interpolate(coarse, fine, false)?;
        }

        let mut left_converged = self.comm.is_first();
        let mut left_active = !self.comm.is_first();
        let mut converged = false;
        let mut k = 0;
        while !converged && k < max_iter {
            k += 1;
            for l in 0..num_levels {
                self.stack.level_mut(l).status_mut().set_iteration(k);
            }

            // V-cycle descent with sweeps.
            let mut it = self.stack.finest_iter();
            while !it.is_coarsest() {
                self.stack.level_mut(it.current()).sweep()?;
                let (fine, coarse, transfer) = self.stack.pair_mut(it.transfer())?;
                transfer.restrict(fine, coarse, true)?;
                transfer.fas(dt, fine, coarse)?;
                it.down();
            }

            // Coarse pipeline: the left neighbor's end state of the
            // previous iteration becomes this rank's initial value.
            if left_active && k >= 2 {
                let mut u = self.stack.level(0).new_state();
                encap::recv_state(&mut u, &mut self.comm, rank - 1, data_tag(k - 1, 0))?;
                let coarsest = self.stack.level_mut(0);
                coarsest.set_initial_state(&u)?;
                coarsest.reevaluate(true)?;
            }
            self.stack.level_mut(0).sweep()?;
            if !self.comm.is_last() {
                encap::send_state(
                    self.stack.level(0).end_state()?,
                    &mut self.comm,
                    rank + 1,
                    data_tag(k, 0),
                    false,
                )?;
            }

            // Ascent; the received coarse initial value reaches the finer
            // levels through the initial interpolation.
            while !it.is_finest() {
                it.up();
                let (fine, coarse, transfer) = self.stack.pair_mut(it.transfer())?;
                transfer.interpolate(coarse, fine, true)?;
                if !it.is_finest() {
                    self.stack.level_mut(it.current()).sweep()?;
                }
            }

            // Status token from the left; a converged neighbor also hands
            // over its final coarse and fine end states.
            if left_active {
                let mut msg = StatusMsg::default();
                self.comm.recv_status(&mut msg, rank - 1, status_tag(k))?;
                if msg.converged() {
                    left_converged = true;
                    left_active = false;
                    let mut u = self.stack.level(0).new_state();
                    encap::recv_state(&mut u, &mut self.comm, rank - 1, data_tag(k, 0))?;
                    let coarsest = self.stack.level_mut(0);
                    coarsest.set_initial_state(&u)?;
                    coarsest.reevaluate(true)?;

                    let mut u = self.stack.finest().new_state();
                    encap::recv_state(&mut u, &mut self.comm, rank - 1, data_tag(k, finest_level))?;
                    let finest = self.stack.finest_mut();
                    finest.set_initial_state(&u)?;
                    finest.reevaluate(true)?;
                }
            }

            let own_ok = self.stack.finest_mut().converged(false)?;
            converged = own_ok && left_converged;
            self.stack.finest_mut().status_mut().set_converged(converged);

            if !self.comm.is_last() {
                let msg = self.stack.finest().status().to_msg();
                self.comm.isend_status(&msg, rank + 1, status_tag(k))?;
                if converged {
                    encap::send_state(
                        self.stack.finest().end_state()?,
                        &mut self.comm,
                        rank + 1,
                        data_tag(k, finest_level),
                        false,
                    )?;
                }
            }
        }

        if !converged {
            log::warn!(
                "rank {rank} step at t = {t}: {}",
                TimeSieveError::NotConverged {
                    max_iterations: max_iter,
                    abs_res_norm: self.stack.finest().status().abs_res_norm(),
                }
            );
        }
        Ok(())
    }
}
