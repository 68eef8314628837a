use serde::{Serialize, Deserialize};

use crate::error::{NetworkError, Result};

/// Hyperparameters for a training run.
///
/// # Fields
/// - `epochs`         — full passes over the training batches
/// - `batch_size`     — batch boundary step (the first batch is one larger)
/// - `train_fraction` — share of the data used for training, the rest tests
/// - `learn_rate`     — step size; gradients are summed per batch, so divide
///                      by the batch size for mean-gradient descent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub train_fraction: f64,
    pub learn_rate: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 10,
            batch_size: 100,
            train_fraction: 0.8,
            learn_rate: 0.05,
        }
    }
}

impl TrainConfig {
    pub fn new(epochs: usize, batch_size: usize, train_fraction: f64, learn_rate: f64) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            train_fraction,
            learn_rate,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(NetworkError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.train_fraction) {
            return Err(NetworkError::InvalidConfig(format!(
                "train_fraction must lie in [0, 1], got {}",
                self.train_fraction
            )));
        }
        if !self.learn_rate.is_finite() {
            return Err(NetworkError::InvalidConfig(format!(
                "learn_rate must be finite, got {}",
                self.learn_rate
            )));
        }
        Ok(())
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `TrainConfig` from a JSON file.
    pub fn load_json(path: &str) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: TrainConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}
