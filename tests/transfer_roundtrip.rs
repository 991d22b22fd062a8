//! Spectral transfer round trips and geometry guards.

mod util;

use time_sieve::encap::Field;
use time_sieve::prelude::*;

const TAU: f64 = 2.0 * std::f64::consts::PI;

fn two_mode_field_1d(edge: usize) -> Field<1> {
    let mut f = Field::<1>::new(edge);
    f.fill_with(|i| {
        let x = i[0] as f64 / edge as f64;
        (TAU * x).sin() + 0.3 * (2.0 * TAU * x).cos()
    });
    f
}

#[test]
fn coarse_data_survives_interpolate_then_restrict() {
    let mut tr = SpectralTransfer::<1>::new();
    let coarse = two_mode_field_1d(16);
    let mut fine = Field::<1>::new(64);
    tr.interpolate_field(&coarse, &mut fine).unwrap();
    let mut back = Field::<1>::new(16);
    tr.restrict_field(&fine, &mut back).unwrap();
    assert!(util::max_abs_diff(back.as_slice(), coarse.as_slice()) < 1e-12);
}

#[test]
fn two_d_restrict_interpolate_reproduces_the_field() {
    // 32x32 -> 16x16 -> 32x32 round trip on a band-limited field checks the
    // FFT normalization.
    let mut tr = SpectralTransfer::<2>::new();
    let mut fine = Field::<2>::new(32);
    fine.fill_with(|i| {
        let x = i[0] as f64 / 32.0;
        let y = i[1] as f64 / 32.0;
        (TAU * x).sin() + (TAU * y).sin()
    });
    let mut coarse = Field::<2>::new(16);
    tr.restrict_field(&fine, &mut coarse).unwrap();
    let mut back = Field::<2>::new(32);
    tr.interpolate_field(&coarse, &mut back).unwrap();
    assert!(util::max_abs_diff(back.as_slice(), fine.as_slice()) <= 1e-12);
}

#[test]
fn three_d_factor_two_round_trips() {
    let mut tr = SpectralTransfer::<3>::new();
    let mut fine = Field::<3>::new(16);
    fine.fill_with(|i| {
        let x = i[0] as f64 / 16.0;
        let z = i[2] as f64 / 16.0;
        (TAU * x).sin() + 0.5 * (TAU * z).cos()
    });
    let mut coarse = Field::<3>::new(8);
    tr.restrict_field(&fine, &mut coarse).unwrap();
    let mut back = Field::<3>::new(16);
    tr.interpolate_field(&coarse, &mut back).unwrap();
    assert!(util::max_abs_diff(back.as_slice(), fine.as_slice()) <= 1e-12);
}

#[test]
fn three_d_factor_four_fails_loudly() {
    let mut tr = SpectralTransfer::<3>::new();
    let coarse = Field::<3>::new(4);
    let mut fine = Field::<3>::new(16);
    assert!(matches!(
        tr.interpolate_field(&coarse, &mut fine),
        Err(TimeSieveError::UnsupportedCoarsening { dim: 3, factor: 4 })
    ));
}

#[test]
fn matching_initial_values_are_a_fixed_point_of_interpolation() {
    // When the fine boundary value is already the interpolant of the coarse
    // one, interpolate_initial must not move it.
    let mut tr = SpectralTransfer::<1>::new();
    let mut coarse_sw = util::heat1d_sweeper(16, 0.02, QuadKind::GaussLobatto, 3, 0.0);
    let mut fine_sw = util::heat1d_sweeper(32, 0.02, QuadKind::GaussLobatto, 5, 0.0);
    coarse_sw.setup().unwrap();
    fine_sw.setup().unwrap();
    coarse_sw.status_mut().set_dt(0.1);
    fine_sw.status_mut().set_dt(0.1);

    let c0 = coarse_sw.problem().initial(0.0);
    coarse_sw.set_initial_state(&c0).unwrap();
    let mut f0 = fine_sw.new_state();
    tr.interpolate_field(&c0, &mut f0).unwrap();
    fine_sw.set_initial_state(&f0).unwrap();

    tr.interpolate_initial(&coarse_sw, &mut fine_sw).unwrap();
    assert!(util::max_abs_diff(fine_sw.states()[0].as_slice(), f0.as_slice()) < 1e-12);
}

#[test]
fn restriction_moves_all_nodes_and_reevaluates() {
    let mut tr = SpectralTransfer::<1>::new();
    let mut coarse_sw = util::heat1d_sweeper(16, 0.02, QuadKind::GaussLobatto, 3, 0.0);
    let mut fine_sw = util::heat1d_sweeper(32, 0.02, QuadKind::GaussLobatto, 5, 0.0);
    coarse_sw.setup().unwrap();
    fine_sw.setup().unwrap();
    coarse_sw.status_mut().set_dt(0.1);
    fine_sw.status_mut().set_dt(0.1);

    let u0 = fine_sw.problem().initial(0.0);
    fine_sw.set_initial_state(&u0).unwrap();
    fine_sw.spread().unwrap();
    fine_sw.reevaluate(false).unwrap();

    tr.restrict(&fine_sw, &mut coarse_sw, true).unwrap();
    // Every coarse node now carries the injected fine data.
    let expect = coarse_sw.problem().initial(0.0);
    for s in coarse_sw.states() {
        assert!(util::max_abs_diff(s.as_slice(), expect.as_slice()) < 1e-12);
    }
}
