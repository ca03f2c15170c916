//! Decision-step throughput of the HRA agent with dense value heads.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hydra::agent::{td_targets, HraAgent};
use hydra::config::{NetworkConfig, ReinforceConfig};
use hydra::model::{HraModel, ValueModel};
use hydra::replay_buffer::Experience;
use ndarray::{Array1, Array2, Array3};

fn network(heads: usize) -> NetworkConfig {
    let names: Vec<String> = (0..heads).map(|h| format!("component_{}", h)).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut config = NetworkConfig::new(8, 4, &names, &[32, 32]);
    config.save_network = false;
    config
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("agent_predict");
    for &heads in &[1usize, 4, 16] {
        let config = ReinforceConfig {
            batch_size: 32,
            memory_size: 1000,
            seed: Some(1),
            ..Default::default()
        };
        let mut agent = HraAgent::from_configs("bench", vec![0usize, 1, 2, 3], &network(heads), config).unwrap();
        let state = Array1::from_shape_fn(8, |i| i as f32 / 8.0);
        let reward = vec![0.1; heads];

        group.bench_with_input(BenchmarkId::from_parameter(heads), &heads, |b, _| {
            b.iter(|| {
                let decision = agent.predict(black_box(state.view())).unwrap();
                agent.reward(&reward).unwrap();
                black_box(decision.action)
            })
        });
    }
    group.finish();
}

fn bench_model(c: &mut Criterion) {
    let mut model = HraModel::new("bench_eval", &network(4)).unwrap();
    let states = Array2::from_shape_fn((32, 8), |(b, i)| ((b + i) % 7) as f32 / 7.0);
    let targets = Array3::from_elem((4, 32, 4), 0.5f32);

    c.bench_function("model_predict_batch_32", |b| {
        b.iter(|| black_box(model.predict_batch(black_box(states.view())).unwrap()))
    });
    c.bench_function("model_fit_32", |b| {
        b.iter(|| model.fit(black_box(states.view()), black_box(targets.view()), 0).unwrap())
    });
}

fn bench_td_targets(c: &mut Criterion) {
    let batch: Vec<Experience> = (0..32)
        .map(|i| Experience::new(Array1::zeros(8), i % 4, vec![1.0; 4], Array1::zeros(8), i % 10 == 0))
        .collect();
    let refs: Vec<&Experience> = batch.iter().collect();
    let q_values = Array3::from_elem((4, 32, 4), 1.0f32);
    let q_next = Array3::from_elem((4, 32, 4), 2.0f32);

    c.bench_function("td_targets_4x32x4", |b| {
        b.iter(|| td_targets(black_box(&refs), q_values.clone(), black_box(&q_next), 0.99).unwrap())
    });
}

criterion_group!(benches, bench_predict, bench_model, bench_td_targets);
criterion_main!(benches);
