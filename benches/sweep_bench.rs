use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use time_sieve::prelude::*;

fn bench_imex_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("imex_sweep_heat1d");
    for edge in [64usize, 256, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(edge), &edge, |b, &edge| {
            let mut sw = ImexSweeper::new(Heat1d::new(edge, 0.02));
            sw.set_quadrature(Quadrature::new(QuadKind::GaussLobatto, 5).unwrap());
            sw.setup().unwrap();
            sw.status_mut().set_dt(0.01);
            let u0 = sw.problem().initial(0.0);
            sw.set_initial_state(&u0).unwrap();
            sw.spread().unwrap();
            sw.predict().unwrap();
            b.iter(|| {
                sw.sweep().unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_imex_sweep);
criterion_main!(benches);
