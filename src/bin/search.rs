//! Minimal demo front-end: wires one of the `env::demo` environments to the
//! engine and prints the recommended action plus a periodic snapshot line
//! (§6 external interfaces). Not a general experiment launcher — see
//! `SPEC_FULL.md`'s Non-goals.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thts::config::{Algorithm, SearchConfig};
use thts::env::demo::{ChainEnv, FrozenLakeEnv, SelectorGameEnv};
use thts::logger::Logger;
use thts::manager::Manager;
use thts::node::DecisionNode;
use thts::pool::Pool;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DemoEnv {
    Chain,
    FrozenLake,
    Selector,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Which demo environment to search (§8 scenarios 1-3).
    #[arg(long, value_enum, default_value = "chain")]
    env: DemoEnv,

    /// One of uct, puct, alphago, ments, rents, tents, dents, est.
    #[arg(long, default_value = "uct")]
    algorithm: String,

    #[arg(long, default_value_t = 10)]
    chain_length: usize,

    #[arg(long, default_value_t = 8)]
    grid_size: usize,

    #[arg(long, default_value_t = 0.1)]
    slip: f64,

    #[arg(long)]
    max_trials: Option<u64>,

    #[arg(long)]
    max_time_ms: Option<u64>,

    #[arg(long, default_value_t = num_cpus::get())]
    threads: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Exploration bias; negative means AUTO_BIAS (§4.D.1).
    #[arg(long, default_value_t = -1.0)]
    bias: f64,

    #[arg(long, default_value_t = 100)]
    max_depth: usize,

    #[arg(long)]
    two_player: bool,

    #[arg(long)]
    transposition_table: bool,

    /// Emit a structured snapshot line every this-many completed trials.
    #[arg(long, default_value_t = 1_000)]
    log_trial_interval: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let algorithm = Algorithm::from_str(&cli.algorithm).context("parsing --algorithm")?;

    let config = SearchConfig {
        algorithm,
        max_depth: cli.max_depth,
        is_two_player_game: cli.two_player,
        use_transposition_table: cli.transposition_table,
        seed: cli.seed,
        bias: cli.bias,
        num_threads: cli.threads.max(1),
        ..Default::default()
    };

    log::info!(
        "starting search: env={:?} config={}",
        cli.env,
        serde_json::to_string(&config).expect("serialize search config")
    );

    if cli.max_trials.is_none() && cli.max_time_ms.is_none() {
        anyhow::bail!("at least one of --max-trials / --max-time-ms must be set");
    }

    let logger = Arc::new(Logger::stdout(cli.log_trial_interval, Duration::from_secs(3600)));
    let max_time = cli.max_time_ms.map(Duration::from_millis);

    match cli.env {
        DemoEnv::Chain => run(config, Arc::new(ChainEnv::new(cli.chain_length)), logger, cli.max_trials, max_time),
        DemoEnv::FrozenLake => run(
            config,
            Arc::new(FrozenLakeEnv::new(cli.grid_size, cli.slip)),
            logger,
            cli.max_trials,
            max_time,
        ),
        DemoEnv::Selector => run(config, Arc::new(SelectorGameEnv), logger, cli.max_trials, max_time),
    }
}

fn run<Env: thts::env::Environment + 'static>(
    config: SearchConfig,
    env: Arc<Env>,
    logger: Arc<Logger>,
    max_trials: Option<u64>,
    max_time: Option<Duration>,
) -> anyhow::Result<()> {
    let manager = Arc::new(Manager::with_defaults(config, env.clone()).context("building search manager")?);
    let root = Arc::new(DecisionNode::root(env.initial_state()));
    let pool = Pool::new(manager.clone(), root.clone(), Some(logger));

    pool.run_trials(max_trials, max_time, true);

    let recommended = root.recommend_action(&manager);
    println!(
        "recommend_action = {recommended:?} (backups={})",
        pool.completed_backups()
    );
    pool.join();
    Ok(())
}
