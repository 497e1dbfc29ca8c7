use anyhow::Result;
use clap::{Parser, ValueEnum};
use instant::Instant;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use highway_env::{
    config::{EnvConfigOverride, Variant},
    env::{Action, Environment, HighwayEnv},
};

#[derive(Parser)]
#[command(name = "highway-env")]
#[command(about = "Run highway driving episodes and report their rewards")]
struct Args {
    /// Scenario variant
    #[arg(long, value_enum, default_value_t = VariantArg::Highway)]
    variant: VariantArg,

    /// TOML file overriding the variant's default configuration
    #[arg(short, long)]
    config: Option<String>,

    /// Number of episodes to run
    #[arg(short, long, default_value_t = 1)]
    episodes: u32,

    /// Random seed for reproducible episodes
    #[arg(short, long)]
    seed: Option<u64>,

    /// Policy driving the ego vehicle
    #[arg(short, long, value_enum, default_value_t = Policy::Idle)]
    policy: Policy,

    /// Enable verbose logging for per-step rewards
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum VariantArg {
    /// Full-size highway
    Highway,
    /// Smaller, faster highway
    Fast,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Highway => Variant::Highway,
            VariantArg::Fast => Variant::HighwayFast,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Policy {
    /// Neutral throttle and steering
    Idle,
    /// Uniform random throttle, small random steering
    Random,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();

    let variant = Variant::from(args.variant);
    let overrides = match &args.config {
        Some(path) => {
            info!("Loading configuration overrides from: {}", path);
            EnvConfigOverride::load_from_file(path)?
        }
        None => EnvConfigOverride::default(),
    };
    let config = overrides.apply_validated(&variant.default_config())?;
    info!(
        "Loaded {} configuration: {} lanes, {} vehicles, {:.0}s episodes",
        variant.name(),
        config.lanes_count,
        config.vehicles_count,
        config.duration
    );

    let mut env = HighwayEnv::new(variant, config)?;
    let mut policy_rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let start_time = Instant::now();
    let mut total_steps = 0u64;

    for episode in 0..args.episodes {
        env.reset(args.seed.map(|seed| seed + episode as u64))?;

        let mut episode_return = 0.0;
        let crashed = loop {
            let action = match args.policy {
                Policy::Idle => Action::idle(),
                Policy::Random => Action::new(policy_rng.gen_range(0.0..=1.0), policy_rng.gen_range(0.45..=0.55)),
            };
            let outcome = env.step(action)?;
            episode_return += outcome.reward;
            total_steps += 1;
            if outcome.is_done() {
                break outcome.info.crashed;
            }
        };

        info!(
            "Episode {}: return {:.3} over {} steps ({:.1}s), crashed: {}",
            episode,
            episode_return,
            env.steps(),
            env.time(),
            crashed
        );
    }

    let total_time = start_time.elapsed();
    info!("Simulation completed!");
    info!("Total time: {:.2}s", total_time.as_secs_f64());
    info!(
        "Average throughput: {:.1} steps/s",
        total_steps as f64 / total_time.as_secs_f64().max(f64::EPSILON)
    );

    Ok(())
}
