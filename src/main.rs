use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use paipai::engine::moves::MoveWeights;
use paipai::io::strfile;
use paipai::solvers::mc::{McDriver, McParams};
use paipai::solvers::store::StateStore;

/// Environment variable carrying the RNG seed for reproducible runs.
const SEED_VAR: &str = "PAIPAI_SEED";

// --- CLI Definitions ---

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "PAIPAI: Metropolis Monte Carlo over external MLIP energy workers",
    long_about = None
)]
struct Args {
    /// Input structure file
    input: PathBuf,

    /// Number of fast worker slots
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Monte Carlo step budget
    #[arg(long, default_value_t = 1000)]
    steps: u64,

    /// Metropolis temperature, in energy units
    #[arg(long, default_value_t = 1e-3)]
    temp: f64,

    /// Weight of the metallic swap move
    #[arg(long, default_value_t = 70)]
    p_swap_metal: u32,

    /// Weight of the interstitial swap move
    #[arg(long, default_value_t = 30)]
    p_swap_inter: u32,

    /// Weight of the metallic exchange move
    #[arg(long, default_value_t = 0)]
    p_exch_metal: u32,

    /// Weight of the interstitial exchange move
    #[arg(long, default_value_t = 0)]
    p_exch_inter: u32,
}

fn validate(args: &Args) -> Result<MoveWeights, String> {
    if args.workers < 1 {
        return Err("--workers must be at least 1".to_string());
    }
    if args.steps < 1 {
        return Err("--steps must be at least 1".to_string());
    }
    if !(args.temp > 0.0) {
        return Err("--temp must be positive".to_string());
    }
    let weights = MoveWeights {
        swap_metal: args.p_swap_metal,
        swap_inter: args.p_swap_inter,
        exch_metal: args.p_exch_metal,
        exch_inter: args.p_exch_inter,
    };
    if weights.sum() == 0 {
        return Err("move weights must sum to a positive value".to_string());
    }
    Ok(weights)
}

fn build_rng() -> ChaCha8Rng {
    match std::env::var(SEED_VAR) {
        Ok(text) => match text.trim().parse::<u64>() {
            Ok(seed) => {
                log::info!("seeding RNG from {}={}", SEED_VAR, seed);
                ChaCha8Rng::seed_from_u64(seed)
            }
            Err(_) => {
                log::warn!("ignoring unparsable {}={:?}", SEED_VAR, text);
                ChaCha8Rng::from_entropy()
            }
        },
        Err(_) => ChaCha8Rng::from_entropy(),
    }
}

fn run(args: &Args, weights: MoveWeights) -> Result<()> {
    let mut rng = build_rng();

    let store = StateStore::new(".");
    store.prepare_tree()?;

    let structure = strfile::load(&args.input, &mut rng)
        .with_context(|| format!("parsing {}", args.input.display()))?;
    log::info!(
        "loaded {}: {} metallic atoms, {} interstitial sites",
        args.input.display(),
        structure.num_atoms(),
        structure.num_sites()
    );
    store.seed_state(&structure)?;

    let params = McParams {
        steps: args.steps,
        temperature: args.temp,
        workers: args.workers,
        weights,
    };
    let mut driver = McDriver::new(params, store, rng)?;
    let summary = driver.run()?;

    match summary.final_energy {
        Some(e) => log::info!(
            "MC finished: {} steps, {} accepted, final E = {:.6}",
            summary.mc_steps,
            summary.accept_count,
            e
        ),
        None => log::info!("MC finished without ever receiving a valid report"),
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let weights = match validate(&args) {
        Ok(w) => w,
        Err(msg) => {
            eprintln!("error: {}", msg);
            process::exit(2);
        }
    };

    if let Err(e) = run(&args, weights) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}
