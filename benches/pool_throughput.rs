criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(2));
    targets =
        searching_chain_with_uct,
        searching_chain_with_ments,
        searching_frozen_lake_with_puct,
        sampling_alias_table,
        building_alias_table,
}

fn searching_chain_with_uct(c: &mut criterion::Criterion) {
    c.bench_function("run 2000 UCT trials on a length-10 Chain", |b| {
        b.iter(|| {
            let config = SearchConfig {
                algorithm: Algorithm::Uct,
                max_depth: 12,
                num_threads: 1,
                ..Default::default()
            };
            let env = Arc::new(ChainEnv::new(10));
            let manager = Arc::new(Manager::with_defaults(config, env.clone()).unwrap());
            let root = Arc::new(DecisionNode::root(env.initial_state()));
            let pool = Pool::new(manager, root, None);
            pool.run_trials(Some(2_000), None, true);
            pool.join();
        })
    });
}

fn searching_chain_with_ments(c: &mut criterion::Criterion) {
    c.bench_function("run 2000 MENTS trials on a length-10 Chain", |b| {
        b.iter(|| {
            let config = SearchConfig {
                algorithm: Algorithm::Ments,
                max_depth: 12,
                num_threads: 1,
                ..Default::default()
            };
            let env = Arc::new(ChainEnv::new(10));
            let manager = Arc::new(Manager::with_defaults(config, env.clone()).unwrap());
            let root = Arc::new(DecisionNode::root(env.initial_state()));
            let pool = Pool::new(manager, root, None);
            pool.run_trials(Some(2_000), None, true);
            pool.join();
        })
    });
}

fn searching_frozen_lake_with_puct(c: &mut criterion::Criterion) {
    c.bench_function("run 2000 PUCT trials on an 8x8 FrozenLake", |b| {
        b.iter(|| {
            let config = SearchConfig {
                algorithm: Algorithm::Puct,
                max_depth: 64,
                num_threads: 1,
                ..Default::default()
            };
            let env = Arc::new(FrozenLakeEnv::new(8, 0.1));
            let manager = Arc::new(Manager::with_defaults(config, env.clone()).unwrap());
            let root = Arc::new(DecisionNode::root(env.initial_state()));
            let pool = Pool::new(manager, root, None);
            pool.run_trials(Some(2_000), None, true);
            pool.join();
        })
    });
}

fn building_alias_table(c: &mut criterion::Criterion) {
    let probs = vec![0.4, 0.3, 0.2, 0.1];
    c.bench_function("build an alias table over 4 actions", |b| {
        b.iter(|| AliasTable::build(&probs))
    });
}

fn sampling_alias_table(c: &mut criterion::Criterion) {
    let probs = vec![0.4, 0.3, 0.2, 0.1];
    let table = AliasTable::build(&probs);
    let mut rng = SmallRng::seed_from_u64(7);
    c.bench_function("sample 10000 draws from a built alias table", |b| {
        b.iter(|| {
            for _ in 0..10_000 {
                table.sample(&mut rng);
            }
        })
    });
}

use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::sync::Arc;
use thts::config::{Algorithm, SearchConfig};
use thts::env::demo::{ChainEnv, FrozenLakeEnv};
use thts::manager::Manager;
use thts::node::DecisionNode;
use thts::policy::alias::AliasTable;
use thts::pool::Pool;
