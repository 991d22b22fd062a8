//! The IMEX sweeper engine: forward-Euler treatment of the explicit
//! right-hand side, backward-Euler solves for the implicit one, corrected
//! node by node in delta form.

use crate::config::RunConfig;
use crate::encap::Encap;
use crate::problem::Problem;
use crate::quadrature::Quadrature;
use crate::status::Status;
use crate::sweeper::Sweeper;
use crate::time_error::TimeSieveError;

/// Consecutive iterations with a growing residual before a warning is
/// emitted. Divergence is reported, never auto-recovered; controller policy
/// decides what to do with a step that will not contract.
const DEFAULT_DIVERGENCE_LIMIT: usize = 5;

/// IMEX sweeper over a [`Problem`]: owns the per-step node states of one
/// level and corrects them with SDC sweeps.
pub struct ImexSweeper<P: Problem> {
    problem: P,
    quadrature: Option<Quadrature>,
    status: Status,

    states: Vec<P::State>,
    previous: Vec<P::State>,
    f_expl: Vec<P::State>,
    f_impl: Vec<P::State>,
    tau: Vec<P::State>,
    residuals: Vec<P::State>,
    end_state: Option<P::State>,

    abs_res_tol: f64,
    rel_res_tol: f64,
    abs_res_norms: Vec<f64>,
    rel_res_norms: Vec<f64>,

    last_abs_norm: f64,
    divergence_streak: usize,
    divergence_limit: usize,

    num_expl_evals: usize,
    num_impl_evals: usize,
    num_impl_solves: usize,
}

impl<P: Problem> ImexSweeper<P> {
    pub fn new(problem: P) -> Self {
        ImexSweeper {
            problem,
            quadrature: None,
            status: Status::new(),
            states: Vec::new(),
            previous: Vec::new(),
            f_expl: Vec::new(),
            f_impl: Vec::new(),
            tau: Vec::new(),
            residuals: Vec::new(),
            end_state: None,
            abs_res_tol: 0.0,
            rel_res_tol: 0.0,
            abs_res_norms: Vec::new(),
            rel_res_norms: Vec::new(),
            last_abs_norm: f64::INFINITY,
            divergence_streak: 0,
            divergence_limit: DEFAULT_DIVERGENCE_LIMIT,
            num_expl_evals: 0,
            num_impl_evals: 0,
            num_impl_solves: 0,
        }
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn problem_mut(&mut self) -> &mut P {
        &mut self.problem
    }

    /// Residual tolerances; a value of zero (or less) disables the
    /// corresponding check.
    pub fn set_residual_tolerances(&mut self, abs_res_tol: f64, rel_res_tol: f64) {
        self.abs_res_tol = abs_res_tol;
        self.rel_res_tol = rel_res_tol;
    }

    /// Read tolerances from runtime options, keeping the current values as
    /// defaults.
    pub fn set_options(&mut self, cfg: &RunConfig) {
        self.abs_res_tol = cfg.get_or("abs_res_tol", self.abs_res_tol);
        self.rel_res_tol = cfg.get_or("rel_res_tol", self.rel_res_tol);
        self.divergence_limit = cfg.get_or("divergence_limit", self.divergence_limit);
    }

    /// Register this sweeper's runtime options.
    pub fn register_options(cfg: &mut RunConfig) {
        cfg.add_option("sweeper", "abs_res_tol", "absolute residual tolerance");
        cfg.add_option("sweeper", "rel_res_tol", "relative residual tolerance");
        cfg.add_option(
            "sweeper",
            "divergence_limit",
            "growing-residual iterations before a divergence warning",
        );
    }

    fn quad(&self) -> Result<&Quadrature, TimeSieveError> {
        self.quadrature
            .as_ref()
            .ok_or(TimeSieveError::SetupIncomplete("quadrature not attached"))
    }

    fn ensure_setup(&self) -> Result<(), TimeSieveError> {
        if self.states.is_empty() {
            return Err(TimeSieveError::SetupIncomplete("sweeper not set up"));
        }
        Ok(())
    }

    /// Evaluate both right-hand sides at node `m`.
    fn eval_node(&mut self, t_m: f64, m: usize) {
        self.f_expl[m] = self.problem.eval_expl(t_m, &self.states[m]);
        self.f_impl[m] = self.problem.eval_impl(t_m, &self.states[m]);
        self.num_expl_evals += 1;
        self.num_impl_evals += 1;
    }

    /// Euler chain over the sub-intervals shared by predict and sweep.
    /// `q_int[m]`, when present, is added to the right-hand side of node m.
    fn euler_chain(&mut self, q_int: Option<&[P::State]>) -> Result<(), TimeSieveError> {
        let quad = self.quad()?;
        let aug = quad.augmented_nodes();
        let num_nodes = quad.num_nodes();
        let t = self.status.time();
        let dt = self.status.dt();

        for m in 1..=num_nodes {
            let ds = dt * (aug[m] - aug[m - 1]);
            let t_m = t + dt * aug[m];
            if ds <= dt * 1e-13 {
                // Zero-width sub-interval: the left boundary is itself a
                // node. The update degenerates to the boundary value plus
                // the node correction; no implicit solve is possible here.
                let mut u = self.states[m - 1].clone();
                if let Some(q_int) = q_int {
                    u.axpy(1.0, &q_int[m]);
                }
                self.states[m].copy_from(&u);
                self.eval_node(t_m, m);
                continue;
            }
            let mut rhs = self.states[m - 1].clone();
            rhs.axpy(ds, &self.f_expl[m - 1]);
            if let Some(q_int) = q_int {
                rhs.axpy(1.0, &q_int[m]);
            }
            let (u, f) = self
                .problem
                .solve_impl(t_m, ds, &rhs)?;
            self.num_impl_solves += 1;
            self.states[m] = u;
            self.f_impl[m] = f;
            self.f_expl[m] = self.problem.eval_expl(t_m, &self.states[m]);
            self.num_expl_evals += 1;
        }
        Ok(())
    }

    fn check_tolerances(&self, abs_norm: f64, rel_norm: f64, scope: &str) -> bool {
        if self.abs_res_tol <= 0.0 && self.rel_res_tol <= 0.0 {
            log::warn!("no residual tolerances set, skipping {scope} convergence check");
            return false;
        }
        if abs_norm < self.abs_res_tol {
            log::debug!("converged w.r.t. absolute residual tolerance: {abs_norm:.3e} < {:.3e}",
                self.abs_res_tol);
            true
        } else if rel_norm < self.rel_res_tol {
            log::debug!("converged w.r.t. relative residual tolerance: {rel_norm:.3e} < {:.3e}",
                self.rel_res_tol);
            true
        } else {
            false
        }
    }
}

impl<P: Problem> Sweeper for ImexSweeper<P> {
    type State = P::State;

    fn set_quadrature(&mut self, q: Quadrature) {
        self.quadrature = Some(q);
    }

    fn quadrature(&self) -> Option<&Quadrature> {
        self.quadrature.as_ref()
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }

    fn setup(&mut self) -> Result<(), TimeSieveError> {
        let quad = self.quad()?;
        log::debug!(
            "setting up IMEX sweeper: {} with {} nodes, expected order {}",
            quad.kind(),
            quad.num_nodes(),
            quad.expected_order()
        );
        let slots = quad.num_nodes() + 1;
        fn alloc<P: Problem>(problem: &P, n: usize) -> Vec<P::State> {
            (0..n).map(|_| problem.new_state()).collect()
        }
        self.states = alloc(&self.problem, slots);
        self.previous = alloc(&self.problem, slots);
        self.f_expl = alloc(&self.problem, slots);
        self.f_impl = alloc(&self.problem, slots);
        self.tau = alloc(&self.problem, slots);
        self.residuals = alloc(&self.problem, slots);
        self.end_state = Some(self.problem.new_state());
        self.abs_res_norms = vec![0.0; slots];
        self.rel_res_norms = vec![0.0; slots];
        Ok(())
    }

    fn new_state(&self) -> P::State {
        self.problem.new_state()
    }

    fn states(&self) -> &[P::State] {
        &self.states
    }

    fn states_mut(&mut self) -> &mut [P::State] {
        &mut self.states
    }

    fn previous_states(&self) -> &[P::State] {
        &self.previous
    }

    fn tau(&self) -> &[P::State] {
        &self.tau
    }

    fn tau_mut(&mut self) -> &mut [P::State] {
        &mut self.tau
    }

    fn residuals(&self) -> &[P::State] {
        &self.residuals
    }

    fn initial_state(&self) -> Result<&P::State, TimeSieveError> {
        self.ensure_setup()?;
        Ok(&self.states[0])
    }

    fn set_initial_state(&mut self, u: &P::State) -> Result<(), TimeSieveError> {
        self.ensure_setup()?;
        self.states[0].copy_from(u);
        Ok(())
    }

    fn end_state(&self) -> Result<&P::State, TimeSieveError> {
        self.end_state
            .as_ref()
            .ok_or(TimeSieveError::SetupIncomplete("sweeper not set up"))
    }

    fn spread(&mut self) -> Result<(), TimeSieveError> {
        self.ensure_setup()?;
        let (first, rest) = self.states.split_first_mut().expect("states allocated");
        for s in rest {
            s.copy_from(first);
        }
        for t in self.tau.iter_mut() {
            t.zero();
        }
        for r in self.residuals.iter_mut() {
            r.zero();
        }
        Ok(())
    }

    fn save(&mut self) {
        for (p, s) in self.previous.iter_mut().zip(self.states.iter()) {
            p.copy_from(s);
        }
    }

    fn reevaluate(&mut self, initial_only: bool) -> Result<(), TimeSieveError> {
        self.ensure_setup()?;
        let aug = self.quad()?.augmented_nodes();
        let t = self.status.time();
        let dt = self.status.dt();
        let last = if initial_only { 0 } else { aug.len() - 1 };
        for m in 0..=last {
            self.eval_node(t + dt * aug[m], m);
        }
        Ok(())
    }

    fn predict(&mut self) -> Result<(), TimeSieveError> {
        self.ensure_setup()?;
        log::trace!("predicting at t = {}", self.status.time());
        self.reevaluate(true)?;
        self.save();
        self.last_abs_norm = f64::INFINITY;
        self.divergence_streak = 0;
        self.euler_chain(None)?;
        let dt = self.status.dt();
        self.integrate_end_state(dt)
    }

    fn sweep(&mut self) -> Result<(), TimeSieveError> {
        self.ensure_setup()?;
        log::trace!(
            "sweeping at t = {} (iteration {})",
            self.status.time(),
            self.status.iteration()
        );
        self.save();

        let quad = self.quad()?;
        let aug = quad.augmented_nodes();
        let num_nodes = quad.num_nodes();
        let dt = self.status.dt();

        // Node integrals of the previous iterate, with the node-local Euler
        // terms of the previous iterate folded in so the delta form reduces
        // to one solve per node.
        let mut q_int: Vec<P::State> = Vec::with_capacity(num_nodes + 1);
        q_int.push(self.problem.new_state());
        for m in 1..=num_nodes {
            let s_row = &quad.s_mat()[m - 1];
            let mut acc = self.problem.new_state();
            for (j, &w) in s_row.iter().enumerate() {
                acc.axpy(dt * w, &self.f_expl[j]);
                acc.axpy(dt * w, &self.f_impl[j]);
            }
            let ds = dt * (aug[m] - aug[m - 1]);
            acc.axpy(-ds, &self.f_expl[m - 1]);
            acc.axpy(-ds, &self.f_impl[m]);
            acc.axpy(1.0, &self.tau[m]);
            acc.axpy(-1.0, &self.tau[m - 1]);
            q_int.push(acc);
        }

        self.euler_chain(Some(&q_int))?;
        self.integrate_end_state(dt)
    }

    fn compute_residuals(&mut self, only_last: bool) -> Result<(), TimeSieveError> {
        self.ensure_setup()?;
        let q_mat = self.quad()?.q_mat().to_vec();
        let num_nodes = q_mat.len();
        let dt = self.status.dt();
        let first = if only_last { num_nodes } else { 1 };
        for m in first..=num_nodes {
            let q_row = &q_mat[m - 1];
            let mut r = self.states[0].clone();
            for (j, &w) in q_row.iter().enumerate() {
                r.axpy(dt * w, &self.f_expl[j]);
                r.axpy(dt * w, &self.f_impl[j]);
            }
            r.axpy(1.0, &self.tau[m]);
            r.axpy(-1.0, &self.states[m]);
            self.residuals[m] = r;
        }
        if !only_last {
            self.residuals[0].zero();
        }
        Ok(())
    }

    fn converged(&mut self, pre_check: bool) -> Result<bool, TimeSieveError> {
        self.compute_residuals(pre_check)?;
        let last = self.residuals.len() - 1;
        self.abs_res_norms[last] = self.residuals[last].norm_inf();
        self.rel_res_norms[last] = self.abs_res_norms[last] / self.states[last].norm_inf();

        if pre_check {
            return Ok(self.check_tolerances(
                self.abs_res_norms[last],
                self.rel_res_norms[last],
                "preliminary",
            ));
        }

        for m in 0..last {
            let norm = self.residuals[m].norm_inf();
            self.abs_res_norms[m] = norm;
            self.rel_res_norms[m] = norm / self.states[m].norm_inf();
        }
        let abs_max = self.abs_res_norms.iter().cloned().fold(0.0, f64::max);
        let rel_max = self.rel_res_norms.iter().cloned().fold(0.0, f64::max);
        self.status.set_abs_res_norm(abs_max);
        self.status.set_rel_res_norm(rel_max);

        if abs_max > self.last_abs_norm {
            self.divergence_streak += 1;
            if self.divergence_streak >= self.divergence_limit {
                log::warn!(
                    "residual grew for {} consecutive iterations (|r| = {abs_max:.3e})",
                    self.divergence_streak
                );
            }
        } else {
            self.divergence_streak = 0;
        }
        self.last_abs_norm = abs_max;

        Ok(self.check_tolerances(abs_max, rel_max, "full"))
    }

    fn integrate_end_state(&mut self, dt: f64) -> Result<(), TimeSieveError> {
        self.ensure_setup()?;
        let right_is_node = self.quad()?.right_is_node();
        let b_vec = if right_is_node {
            Vec::new()
        } else {
            self.quad()?.b_vec().to_vec()
        };
        let end = self
            .end_state
            .as_mut()
            .ok_or(TimeSieveError::SetupIncomplete("sweeper not set up"))?;
        if right_is_node {
            end.copy_from(self.states.last().expect("states allocated"));
        } else {
            end.copy_from(&self.states[0]);
            for (j, &w) in b_vec.iter().enumerate() {
                end.axpy(dt * w, &self.f_expl[j]);
                end.axpy(dt * w, &self.f_impl[j]);
            }
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<(), TimeSieveError> {
        self.ensure_setup()?;
        let end = self
            .end_state
            .as_ref()
            .ok_or(TimeSieveError::SetupIncomplete("sweeper not set up"))?
            .clone();
        self.states[0].copy_from(&end);
        self.reevaluate(true)
    }

    fn rhs_integrals(&self, dt: f64) -> Result<Vec<P::State>, TimeSieveError> {
        self.ensure_setup()?;
        let quad = self.quad()?;
        let num_nodes = quad.num_nodes();
        let mut integrals = Vec::with_capacity(num_nodes + 1);
        integrals.push(self.problem.new_state());
        for m in 1..=num_nodes {
            let q_row = &quad.q_mat()[m - 1];
            let mut acc = self.problem.new_state();
            for (j, &w) in q_row.iter().enumerate() {
                acc.axpy(dt * w, &self.f_expl[j]);
                acc.axpy(dt * w, &self.f_impl[j]);
            }
            integrals.push(acc);
        }
        Ok(integrals)
    }

    fn post_step(&mut self) {
        log::debug!(
            "function evaluations this step: expl {} impl {} solves {}",
            self.num_expl_evals,
            self.num_impl_evals,
            self.num_impl_solves
        );
        self.num_expl_evals = 0;
        self.num_impl_evals = 0;
        self.num_impl_solves = 0;
    }
}
