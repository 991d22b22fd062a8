//! Controllers: the drivers that orchestrate sweeps across iterations,
//! levels, and (for PFASST) time-parallel ranks.
//!
//! All controllers share the same surface: levels are added coarsest first
//! with the transfer coupling each level to the one below, the duration is
//! fixed with `set_duration(t0, t_end, dt, max_iter)`, `setup` allocates
//! every level, and `run` integrates. Cross-level ties are plain indices
//! into the level array rather than owning links.

mod mlsdc;
mod pfasst;
mod sdc;

pub use mlsdc::MlsdcController;
pub use pfasst::PfasstController;
pub use sdc::SdcController;

use crate::sweeper::Sweeper;
use crate::time_error::TimeSieveError;
use crate::transfer::Transfer;

/// Cursor over the level hierarchy with the customary accessors. `current`
/// walks the array; `fine`/`coarse` are its neighbors; `transfer` indexes
/// the operator coupling `current` with the level below it.
#[derive(Copy, Clone, Debug)]
pub struct LevelIter {
    level: usize,
    num_levels: usize,
}

impl LevelIter {
    #[inline]
    pub fn current(&self) -> usize {
        self.level
    }
    #[inline]
    pub fn fine(&self) -> usize {
        self.level + 1
    }
    #[inline]
    pub fn coarse(&self) -> usize {
        self.level - 1
    }
    #[inline]
    pub fn transfer(&self) -> usize {
        self.level
    }
    #[inline]
    pub fn is_finest(&self) -> bool {
        self.level + 1 == self.num_levels
    }
    #[inline]
    pub fn is_coarsest(&self) -> bool {
        self.level == 0
    }
    #[inline]
    pub fn down(&mut self) {
        self.level -= 1;
    }
    #[inline]
    pub fn up(&mut self) {
        self.level += 1;
    }
}

/// Ordered level hierarchy: sweepers coarsest first, with the transfer for
/// each adjacent pair stored at the finer level's index.
pub(crate) struct LevelStack<S, T> {
    levels: Vec<S>,
    transfers: Vec<Option<T>>,
}

impl<S: Sweeper, T: Transfer<S>> LevelStack<S, T> {
    pub fn new() -> Self {
        LevelStack {
            levels: Vec::new(),
            transfers: Vec::new(),
        }
    }

    /// Append a level above the current finest. All levels except the
    /// coarsest need the transfer coupling them to the level below.
    pub fn add_level(&mut self, sweeper: S, transfer: Option<T>) {
        self.levels.push(sweeper);
        self.transfers.push(transfer);
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, l: usize) -> &S {
        &self.levels[l]
    }

    pub fn level_mut(&mut self, l: usize) -> &mut S {
        &mut self.levels[l]
    }

    pub fn finest(&self) -> &S {
        self.levels.last().expect("at least one level")
    }

    pub fn finest_mut(&mut self) -> &mut S {
        self.levels.last_mut().expect("at least one level")
    }

    pub fn finest_iter(&self) -> LevelIter {
        LevelIter {
            level: self.num_levels() - 1,
            num_levels: self.num_levels(),
        }
    }

    /// Split borrow of level `l` (fine), level `l - 1` (coarse) and the
    /// transfer between them.
    pub fn pair_mut(&mut self, l: usize) -> Result<(&mut S, &mut S, &mut T), TimeSieveError> {
        if l == 0 || l >= self.levels.len() {
            return Err(TimeSieveError::SetupIncomplete("level index out of range"));
        }
        let (lower, upper) = self.levels.split_at_mut(l);
        let transfer = self.transfers[l]
            .as_mut()
            .ok_or(TimeSieveError::SetupIncomplete(
                "transfer missing between levels",
            ))?;
        Ok((&mut upper[0], &mut lower[l - 1], transfer))
    }

    /// Set up every level, coarsest to finest.
    pub fn setup(&mut self) -> Result<(), TimeSieveError> {
        if self.levels.is_empty() {
            return Err(TimeSieveError::SetupIncomplete("no levels added"));
        }
        if self.transfers.iter().skip(1).any(|t| t.is_none()) {
            return Err(TimeSieveError::SetupIncomplete(
                "transfer missing between levels",
            ));
        }
        for level in self.levels.iter_mut() {
            level.setup()?;
        }
        Ok(())
    }
}

/// Shared duration bookkeeping for all controllers.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct Duration {
    pub t0: f64,
    pub t_end: f64,
    pub dt: f64,
    pub max_iter: usize,
}

impl Duration {
    pub fn set(&mut self, t0: f64, t_end: f64, dt: f64, max_iter: usize) {
        self.t0 = t0;
        self.t_end = t_end;
        self.dt = dt;
        self.max_iter = max_iter;
    }

    /// Number of whole steps covering `[t0, t_end)`.
    pub fn num_steps(&self) -> usize {
        if self.dt <= 0.0 || self.t_end <= self.t0 {
            return 0;
        }
        let steps = ((self.t_end - self.t0) / self.dt).round();
        if ((steps * self.dt) - (self.t_end - self.t0)).abs() > 1e-9 * self.dt {
            log::warn!(
                "duration [{}, {}) is not a whole multiple of dt = {}; running {} steps",
                self.t0,
                self.t_end,
                self.dt,
                steps
            );
        }
        steps as usize
    }

    pub fn apply_to<S: Sweeper>(&self, sweeper: &mut S) {
        let status = sweeper.status_mut();
        status.set_dt(self.dt);
        status.set_t_end(self.t_end);
        status.set_max_iterations(self.max_iter);
        status.set_time(self.t0);
    }
}
