//! SDC on the spectral heat and advection-diffusion problems.

mod util;

use time_sieve::prelude::*;

#[test]
fn heat1d_single_step_is_accurate() {
    util::init_logs();
    let sw = util::heat1d_sweeper(64, 0.02, QuadKind::GaussRadau, 5, 1e-12);
    let mut ctl = SdcController::new(sw);
    ctl.set_duration(0.0, 0.1, 0.1, 20);
    ctl.setup().unwrap();
    let u0 = ctl.sweeper().problem().initial(0.0);
    ctl.sweeper_mut().set_initial_state(&u0).unwrap();
    ctl.run().unwrap();

    let mut diff = ctl.sweeper().end_state().unwrap().clone();
    diff.axpy(-1.0, &ctl.sweeper().problem().exact(0.1));
    assert!(
        diff.norm_inf() <= 1e-6,
        "heat end-state error {}",
        diff.norm_inf()
    );

    // Per-node diagnostics stay small across the whole step.
    let sw = ctl.sweeper();
    let times: Vec<f64> = sw
        .quadrature()
        .unwrap()
        .augmented_nodes()
        .iter()
        .map(|&tau| 0.1 * tau)
        .collect();
    let errors = time_sieve::problems::compute_error(sw.problem(), sw.states(), &times);
    for rel in time_sieve::problems::compute_relative_error::<Heat1d>(&errors, sw.states()) {
        assert!(rel < 1e-5);
    }
}

#[test]
fn heat2d_single_step_is_accurate() {
    util::init_logs();
    let mut sw = ImexSweeper::new(Heat2d::new(32, 0.1));
    sw.set_quadrature(Quadrature::new(QuadKind::GaussRadau, 5).unwrap());
    sw.set_residual_tolerances(1e-12, 0.0);
    let mut ctl = SdcController::new(sw);
    ctl.set_duration(0.0, 0.1, 0.1, 20);
    ctl.setup().unwrap();
    let u0 = ctl.sweeper().problem().initial(0.0);
    ctl.sweeper_mut().set_initial_state(&u0).unwrap();
    ctl.run().unwrap();

    let mut diff = ctl.sweeper().end_state().unwrap().clone();
    diff.axpy(-1.0, &ctl.sweeper().problem().exact(0.1));
    assert!(
        diff.norm_inf() <= 1e-6,
        "2D heat end-state error {}",
        diff.norm_inf()
    );
}

#[test]
fn advec_diff_converges_within_two_m_sweeps_per_step() {
    util::init_logs();
    let num_nodes = 5;
    let mut sw = ImexSweeper::new(AdvecDiff1d::new(64, 0.02, 1.0));
    sw.set_quadrature(Quadrature::new(QuadKind::GaussLobatto, num_nodes).unwrap());
    sw.set_residual_tolerances(1e-10, 0.0);
    sw.setup().unwrap();

    let dt = 0.01;
    sw.status_mut().set_dt(dt);
    let u0 = sw.problem().initial(0.0);
    sw.set_initial_state(&u0).unwrap();

    for step in 0..10 {
        let t = step as f64 * dt;
        sw.status_mut().begin_step(t);
        if step > 0 {
            sw.advance().unwrap();
        }
        sw.spread().unwrap();
        sw.predict().unwrap();

        let mut sweeps = 0;
        while !sw.converged(false).unwrap() {
            sweeps += 1;
            assert!(
                sweeps <= 2 * num_nodes,
                "step {step} needed more than {} sweeps",
                2 * num_nodes
            );
            sw.status_mut().set_iteration(sweeps);
            sw.sweep().unwrap();
        }
    }

    let mut diff = sw.end_state().unwrap().clone();
    diff.axpy(-1.0, &sw.problem().exact(0.1));
    assert!(diff.norm_inf() < 1e-4);
}
