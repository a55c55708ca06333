use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lattix_sampler::{
    BatchSource, Fact, FactIndex, Mode, NegativeSampler, SamplerConfig, TrainingExampleBuilder,
    TrainingLoader,
};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;

const NENTITY: usize = 10_000;
const NRELATION: usize = 20;

// Ring-like graph: each entity links to its next three neighbours.
fn facts() -> Vec<Fact> {
    let n = NENTITY as i64;
    (0..n)
        .flat_map(|h| {
            (1..=3).map(move |step| Fact::new(h, (h + step) % NRELATION as i64, (h + step) % n))
        })
        .collect()
}

fn bench_negative_sampling(c: &mut Criterion) {
    let index = FactIndex::new(facts(), NENTITY, NRELATION).unwrap();
    let sampler = NegativeSampler::new(&index);
    let fact = index.facts()[0];
    let mut rng = XorShiftRng::seed_from_u64(42);

    c.bench_function("negative_sample_256", |b| {
        b.iter(|| {
            sampler
                .sample(&mut rng, black_box(&fact), Mode::TailBatch, 256)
                .unwrap()
        })
    });
}

fn bench_training_epoch(c: &mut Criterion) {
    let config = SamplerConfig::default()
        .with_negative_sample_size(64)
        .with_pair_sample_size(8)
        .with_batch_size(1024);
    let index = Arc::new(FactIndex::from_config(facts(), NENTITY, NRELATION, &config).unwrap());
    let builder = TrainingExampleBuilder::new(index, Mode::HeadBatch, &config).unwrap();
    let mut loader = TrainingLoader::new(builder, &config).unwrap();

    c.bench_function("training_epoch_30k_facts", |b| {
        b.iter(|| {
            for batch in loader.pass() {
                black_box(batch.unwrap());
            }
        })
    });
}

criterion_group!(benches, bench_negative_sampling, bench_training_epoch);
criterion_main!(benches);
