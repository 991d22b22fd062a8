//! Per-step scalar bookkeeping shared by sweepers and controllers, plus its
//! packed wire representation.
//!
//! Wire format conventions follow the rest of the crate: the packed record is
//! `#[repr(C)]` and `bytemuck::Pod`-safe, all fields little-endian fixed
//! width on the wire.

use bytemuck::{Pod, Zeroable};

/// Converged on this step.
pub const FLAG_CONVERGED: u32 = 1;
/// Converged on the previous step.
pub const FLAG_PREV_CONVERGED: u32 = 1 << 1;

/// Scalar state of one time step on one level: current time, step width,
/// iteration counters, residual norms and termination flags.
#[derive(Clone, Debug, Default)]
pub struct Status {
    time: f64,
    dt: f64,
    t_end: f64,
    iteration: usize,
    max_iterations: usize,
    abs_res_norm: f64,
    rel_res_norm: f64,
    converged: bool,
    previous_converged: bool,
}

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }
    #[inline]
    pub fn set_time(&mut self, t: f64) {
        self.time = t;
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }
    #[inline]
    pub fn set_dt(&mut self, dt: f64) {
        self.dt = dt;
    }

    #[inline]
    pub fn t_end(&self) -> f64 {
        self.t_end
    }
    #[inline]
    pub fn set_t_end(&mut self, t_end: f64) {
        self.t_end = t_end;
    }

    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }
    #[inline]
    pub fn set_iteration(&mut self, k: usize) {
        self.iteration = k;
    }

    #[inline]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
    #[inline]
    pub fn set_max_iterations(&mut self, n: usize) {
        self.max_iterations = n;
    }

    #[inline]
    pub fn abs_res_norm(&self) -> f64 {
        self.abs_res_norm
    }
    #[inline]
    pub fn set_abs_res_norm(&mut self, norm: f64) {
        self.abs_res_norm = norm;
    }

    #[inline]
    pub fn rel_res_norm(&self) -> f64 {
        self.rel_res_norm
    }
    #[inline]
    pub fn set_rel_res_norm(&mut self, norm: f64) {
        self.rel_res_norm = norm;
    }

    #[inline]
    pub fn converged(&self) -> bool {
        self.converged
    }
    #[inline]
    pub fn set_converged(&mut self, c: bool) {
        self.converged = c;
    }

    #[inline]
    pub fn previous_converged(&self) -> bool {
        self.previous_converged
    }

    /// Begin a new step at `time`: iteration zero, the converged flag moves
    /// into `previous_converged`.
    pub fn begin_step(&mut self, time: f64) {
        self.time = time;
        self.iteration = 0;
        self.previous_converged = self.converged;
        self.converged = false;
        self.abs_res_norm = 0.0;
        self.rel_res_norm = 0.0;
    }

    /// Pack into the wire record.
    pub fn to_msg(&self) -> StatusMsg {
        let mut flags = 0;
        if self.converged {
            flags |= FLAG_CONVERGED;
        }
        if self.previous_converged {
            flags |= FLAG_PREV_CONVERGED;
        }
        StatusMsg {
            time: self.time,
            dt: self.dt,
            abs_res_norm: self.abs_res_norm,
            rel_res_norm: self.rel_res_norm,
            iteration: self.iteration as u32,
            flags,
        }
    }
}

/// Packed status record exchanged between time-neighbor ranks.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct StatusMsg {
    pub time: f64,
    pub dt: f64,
    pub abs_res_norm: f64,
    pub rel_res_norm: f64,
    pub iteration: u32,
    pub flags: u32,
}

impl StatusMsg {
    #[inline]
    pub fn converged(&self) -> bool {
        self.flags & FLAG_CONVERGED != 0
    }

    #[inline]
    pub fn previous_converged(&self) -> bool {
        self.flags & FLAG_PREV_CONVERGED != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msg_flags_round_trip() {
        let mut s = Status::new();
        s.set_time(1.5);
        s.set_dt(0.1);
        s.set_iteration(3);
        s.set_converged(true);
        let msg = s.to_msg();
        assert_eq!(msg.iteration, 3);
        assert!(msg.converged());
        assert!(!msg.previous_converged());

        s.begin_step(1.6);
        let msg = s.to_msg();
        assert!(!msg.converged());
        assert!(msg.previous_converged());
        assert_eq!(msg.iteration, 0);
    }

    #[test]
    fn msg_is_pod_sized() {
        assert_eq!(std::mem::size_of::<StatusMsg>(), 40);
        let msg = StatusMsg {
            time: 0.25,
            dt: 0.5,
            abs_res_norm: 1e-9,
            rel_res_norm: 1e-10,
            iteration: 7,
            flags: FLAG_CONVERGED,
        };
        let bytes = bytemuck::bytes_of(&msg);
        let back: StatusMsg = bytemuck::pod_read_unaligned(bytes);
        assert_eq!(back, msg);
    }
}
