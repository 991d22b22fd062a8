//! Two-level MLSDC against single-level SDC on the same problem.

mod util;

use time_sieve::prelude::*;

const NU: f64 = 0.02;
const DT: f64 = 0.1;
const TOL: f64 = 1e-9;

fn run_sdc_iterations() -> (usize, f64) {
    let sw = util::heat1d_sweeper(64, NU, QuadKind::GaussLobatto, 5, TOL);
    let mut ctl = SdcController::new(sw);
    ctl.set_duration(0.0, DT, DT, 20);
    ctl.setup().unwrap();
    let u0 = ctl.sweeper().problem().initial(0.0);
    ctl.sweeper_mut().set_initial_state(&u0).unwrap();
    ctl.run().unwrap();
    assert!(ctl.sweeper().status().converged());

    let mut diff = ctl.sweeper().end_state().unwrap().clone();
    diff.axpy(-1.0, &ctl.sweeper().problem().exact(DT));
    (ctl.sweeper().status().iteration(), diff.norm_inf())
}

fn run_mlsdc_iterations() -> (usize, f64) {
    let coarse = util::heat1d_sweeper(32, NU, QuadKind::GaussLobatto, 3, TOL);
    let fine = util::heat1d_sweeper(64, NU, QuadKind::GaussLobatto, 5, TOL);

    let mut ctl = MlsdcController::new();
    ctl.add_level(coarse, None);
    ctl.add_level(fine, Some(SpectralTransfer::<1>::new()));
    ctl.set_duration(0.0, DT, DT, 20);
    ctl.setup().unwrap();
    let u0 = ctl.finest().problem().initial(0.0);
    ctl.finest_mut().set_initial_state(&u0).unwrap();
    ctl.run().unwrap();
    assert!(ctl.finest().status().converged());

    let mut diff = ctl.finest().end_state().unwrap().clone();
    diff.axpy(-1.0, &ctl.finest().problem().exact(DT));
    (ctl.finest().status().iteration(), diff.norm_inf())
}

#[test]
fn coarse_corrections_do_not_slow_the_fine_level() {
    util::init_logs();
    let (sdc_iters, sdc_err) = run_sdc_iterations();
    let (ml_iters, ml_err) = run_mlsdc_iterations();
    // One fine sweep per MLSDC iteration, so iteration counts compare
    // directly with single-level SDC.
    assert!(
        ml_iters <= sdc_iters,
        "MLSDC needed {ml_iters} fine sweeps, SDC {sdc_iters}"
    );
    assert!(ml_err < 1e-6);
    assert!(sdc_err < 1e-6);
}

#[test]
fn missing_transfer_is_a_setup_error() {
    let coarse = util::heat1d_sweeper(32, NU, QuadKind::GaussLobatto, 3, TOL);
    let fine = util::heat1d_sweeper(64, NU, QuadKind::GaussLobatto, 5, TOL);
    let mut ctl = MlsdcController::<_, SpectralTransfer<1>>::new();
    ctl.add_level(coarse, None);
    ctl.add_level(fine, None);
    assert!(matches!(
        ctl.setup(),
        Err(TimeSieveError::SetupIncomplete(_))
    ));
}
