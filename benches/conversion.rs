use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kolosal_datatypes::datatypes::{convert, x_metadata, Representation};
use kolosal_datatypes::regression::{
    KNeighborsTimeSeriesRegressor, RegressorConfig, TimeSeriesRegressor,
};
use kolosal_datatypes::testing::{make_panel, make_regression_problem};

fn bench_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("conversion");

    for n_instances in [10, 100, 1000].iter() {
        let x = make_panel(*n_instances, 3, 50, Representation::Numpy3D, Some(42)).unwrap();

        for target in [
            Representation::DfList,
            Representation::PdMultiIndex,
            Representation::NestedUniv,
        ] {
            group.bench_with_input(
                BenchmarkId::new(target.as_str(), n_instances),
                &x,
                |b, x| b.iter(|| convert(black_box(x), target).unwrap()),
            );
        }
    }

    group.finish();
}

fn bench_metadata(c: &mut Criterion) {
    let mut group = c.benchmark_group("metadata");

    for repr in [
        Representation::Numpy3D,
        Representation::DfList,
        Representation::PdMultiIndex,
        Representation::NestedUniv,
    ] {
        let x = make_panel(500, 3, 50, repr, Some(42)).unwrap();
        group.bench_with_input(BenchmarkId::new("x_metadata", repr.as_str()), &x, |b, x| {
            b.iter(|| x_metadata(black_box(x)).unwrap())
        });
    }

    group.finish();
}

fn bench_knn_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn");
    group.sample_size(10);

    let (x, y) = make_regression_problem(1000, 2, 50, Representation::Numpy3D, Some(1)).unwrap();
    for n_jobs in [1, -1].iter() {
        let fitted = TimeSeriesRegressor::new(KNeighborsTimeSeriesRegressor::with_k(5))
            .with_config(RegressorConfig::new().with_n_jobs(*n_jobs))
            .fit(&x, y.clone())
            .unwrap();

        group.bench_with_input(BenchmarkId::new("predict", n_jobs), &x, |b, x| {
            b.iter(|| fitted.predict(black_box(x)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_conversion, bench_metadata, bench_knn_predict);
criterion_main!(benches);
