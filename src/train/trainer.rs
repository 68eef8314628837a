use log::{info, warn};
use std::time::Instant;

use crate::data::data_point::DataPoint;
use crate::error::{NetworkError, Result};
use crate::network::network::Network;
use crate::train::accuracy::accuracy;
use crate::train::epoch_stats::EpochStats;

/// Splits a dataset into train / test mini-batches and drives a `Network` over them.
///
/// The first `floor(train_fraction * len)` points go to training, the rest to
/// testing, order preserved. Inside each partition a batch is closed right
/// after every index `i > 0` with `i % batch_size == 0`, so the first batch
/// holds `batch_size + 1` points, later ones `batch_size`, and a shorter
/// remainder batch is kept.
#[derive(Debug, Clone)]
pub struct Trainer {
    train_batches: Vec<Vec<DataPoint>>,
    test_batches: Vec<Vec<DataPoint>>,
    epochs_run: usize,
}

impl Trainer {
    pub fn new(mut data: Vec<DataPoint>, batch_size: usize, train_fraction: f64) -> Result<Trainer> {
        if batch_size == 0 {
            return Err(NetworkError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&train_fraction) {
            return Err(NetworkError::InvalidConfig(format!(
                "train_fraction must lie in [0, 1], got {train_fraction}"
            )));
        }

        let train_size = (data.len() as f64 * train_fraction).floor() as usize;
        let test = data.split_off(train_size.min(data.len()));

        let train_batches = into_batches(data, batch_size);
        let test_batches = into_batches(test, batch_size);
        info!(
            "trainer: {} train batches, {} test batches (batch size {})",
            train_batches.len(),
            test_batches.len(),
            batch_size
        );

        Ok(Trainer { train_batches, test_batches, epochs_run: 0 })
    }

    /// One `Network::learn` step on training batch `index`.
    pub fn train(&mut self, network: &mut Network, learn_rate: f64, index: usize) -> Result<()> {
        let len = self.train_batches.len();
        let batch = self.train_batches.get_mut(index).ok_or(NetworkError::IndexOutOfRange {
            what: "train batch",
            index,
            len,
        })?;
        network.learn(batch, learn_rate)
    }

    /// Fills the outputs of testing batch `index`.
    pub fn test(&mut self, network: &Network, index: usize) -> Result<()> {
        let len = self.test_batches.len();
        let batch = self.test_batches.get_mut(index).ok_or(NetworkError::IndexOutOfRange {
            what: "test batch",
            index,
            len,
        })?;
        network.calculate_batch_outputs(batch)
    }

    /// Fills the outputs of every testing batch.
    pub fn test_all(&mut self, network: &Network) -> Result<()> {
        for batch in self.test_batches.iter_mut() {
            network.calculate_batch_outputs(batch)?;
        }
        Ok(())
    }

    /// Trains on every training batch in order, then evaluates on the testing batches.
    ///
    /// Fails with `EmptyInput` when the training split is empty.
    pub fn train_epoch(&mut self, network: &mut Network, learn_rate: f64) -> Result<EpochStats> {
        let t_start = Instant::now();

        for index in 0..self.train_batches.len() {
            self.train(network, learn_rate, index)?;
        }
        self.test_all(network)?;
        self.epochs_run += 1;

        let cost = network.cost();
        let train_cost = cost.dataset_cost(&self.train_batches)?;
        let (test_cost, test_accuracy) = if self.test_batches.is_empty() {
            (None, None)
        } else {
            let points: Vec<DataPoint> = self.test_batches.iter().flatten().cloned().collect();
            (Some(cost.dataset_cost(&self.test_batches)?), Some(accuracy(&points)))
        };

        if !train_cost.is_finite() {
            warn!("epoch {}: train cost is {train_cost}", self.epochs_run);
        }

        Ok(EpochStats {
            epoch: self.epochs_run,
            train_cost,
            test_cost,
            test_accuracy,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        })
    }

    pub fn train_batches(&self) -> &[Vec<DataPoint>] {
        &self.train_batches
    }

    pub fn test_batches(&self) -> &[Vec<DataPoint>] {
        &self.test_batches
    }
}

fn into_batches(points: Vec<DataPoint>, batch_size: usize) -> Vec<Vec<DataPoint>> {
    let mut batches = Vec::new();
    let mut batch = Vec::new();

    for (i, point) in points.into_iter().enumerate() {
        batch.push(point);
        if i != 0 && i % batch_size == 0 {
            batches.push(std::mem::take(&mut batch));
        }
    }
    if !batch.is_empty() {
        batches.push(batch);
    }

    batches
}
