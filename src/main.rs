//! Demo driver: learns a two-feature "safe / unsafe" decision rule.
//!
//! Usage: `strata-nn [run-config.json]`. Without a config the defaults below
//! are used. Set `RUST_LOG=debug` for per-batch logging.

use log::{error, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use strata_nn::{DataPoint, Network, NetworkConfig, Result, TrainConfig, Trainer};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    network: NetworkConfig,
    training: TrainConfig,
    samples: usize,
    model_path: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            network: NetworkConfig::new(vec![2, 3, 2]),
            training: TrainConfig::default(),
            samples: 20_000,
            model_path: "model.txt".to_string(),
        }
    }
}

/// Ground truth for the toy dataset.
fn is_safe(x: i32, y: i32) -> bool {
    let half = x / 2;
    half + half * half < y && y < -6 * x * x + 10 * x * x * x
}

/// Integer points in [0, 10]², one-hot `[1, 0]` for safe and `[0, 1]` for unsafe.
fn synthesize<R: Rng>(samples: usize, rng: &mut R) -> Vec<DataPoint> {
    (0..samples)
        .map(|_| {
            let x = rng.gen_range(0..=10);
            let y = rng.gen_range(0..=10);
            let (expected, label) = if is_safe(x, y) { (vec![1.0, 0.0], 0) } else { (vec![0.0, 1.0], 1) };
            DataPoint::from_values(vec![x as f64, y as f64], expected).with_label(label)
        })
        .collect()
}

fn run(config: RunConfig) -> Result<()> {
    config.training.validate()?;

    let mut rng = StdRng::seed_from_u64(config.network.seed);
    let data = synthesize(config.samples, &mut rng);
    let mut network: Network = config.network.build_with_rng(&mut rng)?;
    let mut trainer = Trainer::new(data, config.training.batch_size, config.training.train_fraction)?;

    for _ in 0..config.training.epochs {
        let stats = trainer.train_epoch(&mut network, config.training.learn_rate)?;
        info!(
            "epoch {:>3}: train cost {:.6}, test cost {}, test accuracy {}, {} ms",
            stats.epoch,
            stats.train_cost,
            stats.test_cost.map_or("-".to_string(), |c| format!("{c:.6}")),
            stats.test_accuracy.map_or("-".to_string(), |a| format!("{:.2}%", a * 100.0)),
            stats.elapsed_ms
        );
    }

    let mut queries = [
        DataPoint::from_values(vec![2.45, 5.5], vec![1.0, 0.0]),
        DataPoint::from_values(vec![4.28, 2.87], vec![0.0, 1.0]),
    ];
    network.calculate_batch_outputs(&mut queries)?;
    for query in &queries {
        info!(
            "input {:?}: predicted safe {:.2}% unsafe {:.2}%, expected {:?}",
            query.input.as_slice(),
            query.output[0] * 100.0,
            query.output[1] * 100.0,
            query.expected.as_slice()
        );
    }

    network.save(&config.model_path)
}

fn load_config(args: &[String]) -> Result<RunConfig> {
    match args.get(1) {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
        }
        None => Ok(RunConfig::default()),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let result = load_config(&args).and_then(run);
    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}
