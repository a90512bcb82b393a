use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quantile_calib::binning::bin_matrix;
use quantile_calib::data::Matrix;
use quantile_calib::materialize::materialize;
use quantile_calib::model::RegressionModel;
use quantile_calib::registry::BinningRegistry;
use quantile_calib::{BoosterConfig, QuantileBooster};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::time::Duration;

// abs(ieta) and et like inputs, target spreads with et
fn create_data(n_samples: usize) -> (Vec<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(1903);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let mut ieta = Vec::with_capacity(n_samples);
    let mut et = Vec::with_capacity(n_samples);
    let mut y = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let i: f64 = rng.gen_range(1..=30) as f64;
        let e: f64 = rng.gen_range(1.0..400.0);
        y.push(0.05 * e + 0.1 * i + (1.0 + 0.01 * e) * noise.sample(&mut rng));
        ieta.push(i);
        et.push(e);
    }
    ieta.extend(et);
    (ieta, y)
}

pub fn calibration_benchmarks(c: &mut Criterion) {
    let n_samples = 20_000usize;
    let (data, y) = create_data(n_samples);
    let matrix = Matrix::new(&data, n_samples, 2);

    c.bench_function("bin_matrix", |b| {
        b.iter(|| bin_matrix(black_box(&matrix), black_box(256)).unwrap())
    });

    let mut booster_train = c.benchmark_group("train_booster");
    booster_train.sample_size(10);
    booster_train.warm_up_time(Duration::from_secs(5));
    booster_train.bench_function("train_booster_default", |b| {
        b.iter(|| {
            let mut booster = QuantileBooster::new(BoosterConfig::default()).unwrap();
            booster.fit(black_box(&matrix), black_box(&y)).unwrap();
        })
    });
    booster_train.finish();

    let mut booster = QuantileBooster::new(BoosterConfig::default()).unwrap();
    booster.fit(&matrix, &y).unwrap();

    c.bench_function("predict_parallel", |b| {
        b.iter(|| booster.predict(black_box(&matrix), true))
    });

    let registry = BinningRegistry::default();
    let variables = vec!["abs(ieta)".to_string(), "et".to_string()];
    c.bench_function("materialize_2d", |b| {
        b.iter(|| materialize(black_box(&booster), black_box(&variables), &registry, "regression").unwrap())
    });
}

criterion_group!(benches, calibration_benchmarks);
criterion_main!(benches);
