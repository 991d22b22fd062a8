#![allow(dead_code)]
use time_sieve::prelude::*;

/// One-shot logger so test output carries the crate's warnings.
pub fn init_logs() {
    use once_cell::sync::Lazy;
    static INIT: Lazy<()> = Lazy::new(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
    Lazy::force(&INIT);
}

/// Heat sweeper on `edge` DOFs with the given rule and absolute tolerance.
pub fn heat1d_sweeper(
    edge: usize,
    nu: f64,
    kind: QuadKind,
    num_nodes: usize,
    abs_tol: f64,
) -> ImexSweeper<Heat1d> {
    let mut sw = ImexSweeper::new(Heat1d::new(edge, nu));
    sw.set_quadrature(Quadrature::new(kind, num_nodes).unwrap());
    sw.set_residual_tolerances(abs_tol, 0.0);
    sw
}

pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).fold(0.0, |m, (x, y)| m.max((x - y).abs()))
}
