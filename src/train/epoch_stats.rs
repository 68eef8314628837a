use serde::{Serialize, Deserialize};

/// Statistics for one `Trainer::train_epoch` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Dataset-level cost over the training batches, from the outputs
    /// recorded while learning (each before its batch's update).
    pub train_cost: f64,
    /// Dataset-level cost over the testing batches; `None` without a test split.
    pub test_cost: Option<f64>,
    /// Fraction in [0, 1] of test points whose argmax matches their label.
    pub test_accuracy: Option<f64>,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
