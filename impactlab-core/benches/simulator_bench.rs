//! Criterion benchmarks for ImpactLab hot paths.
//!
//! Benchmarks:
//! 1. Path generation (processes + microstructure + regimes) across horizons
//! 2. Schedule construction for every strategy
//! 3. Cost scoring of one schedule against one path

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use impactlab_core::config::SimulationConfig;
use impactlab_core::cost::CostModel;
use impactlab_core::path::PathGenerator;
use impactlab_core::regime::RegimeConfig;
use impactlab_core::rng::{RngHierarchy, MARKET_STREAM};
use impactlab_core::scenario::ScenarioSpec;
use impactlab_core::strategy::StrategyKind;

fn bench_path_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_generation");
    for horizon in [120usize, 390, 1_950] {
        let config = SimulationConfig {
            horizon,
            ..SimulationConfig::default()
        };
        let generator = PathGenerator::new(&config, None, RegimeConfig::default()).unwrap();
        let hierarchy = RngHierarchy::new(config.seed);
        group.bench_with_input(BenchmarkId::from_parameter(horizon), &horizon, |b, _| {
            b.iter(|| {
                let mut rng = hierarchy.rng_for(MARKET_STREAM, 0);
                black_box(generator.generate(0, &mut rng))
            })
        });
    }
    group.finish();
}

fn bench_schedules(c: &mut Criterion) {
    let config = SimulationConfig::default();
    let generator = PathGenerator::new(&config, None, RegimeConfig::default()).unwrap();
    let profile = generator.forecast_profile();

    let mut group = c.benchmark_group("schedule");
    for kind in StrategyKind::standard(config.urgency) {
        let strategy = kind.build();
        group.bench_function(kind.name(), |b| {
            b.iter(|| {
                black_box(
                    strategy
                        .schedule(config.order_size, config.horizon, &profile)
                        .unwrap(),
                )
            })
        });
    }
    group.finish();
}

fn bench_cost_scoring(c: &mut Criterion) {
    let config = SimulationConfig::default();
    let spec = ScenarioSpec::flash_crash();
    let generator = PathGenerator::new(&config, Some(&spec), RegimeConfig::default()).unwrap();
    let mut rng = RngHierarchy::new(config.seed).rng_for(MARKET_STREAM, 0);
    let path = generator.generate(0, &mut rng);
    let schedule = StrategyKind::AlmgrenChriss {
        urgency: config.urgency,
    }
    .build()
    .schedule(config.order_size, config.horizon, &generator.forecast_profile())
    .unwrap();
    let model = CostModel::new(&config);

    c.bench_function("cost_score", |b| {
        b.iter(|| black_box(model.score(&path, &schedule).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_path_generation,
    bench_schedules,
    bench_cost_scoring
);
criterion_main!(benches);
