use serde::{Serialize, Deserialize};

use crate::math::{matrix::Matrix, scalar::Scalar};

/// One labelled sample.
///
/// `input` is 1×features, `expected` is 1×classes. `output` is written by
/// `Network::calculate_outputs` / `Network::learn` and is stale otherwise.
/// `label` is the class index used only for accuracy reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Scalar + Deserialize<'de>"))]
pub struct DataPoint<T = f64> {
    pub input: Matrix<T>,
    pub expected: Matrix<T>,
    #[serde(default)]
    pub output: Matrix<T>,
    #[serde(default)]
    pub label: Option<usize>,
}

impl<T: Scalar> DataPoint<T> {
    pub fn new(input: Matrix<T>, expected: Matrix<T>) -> DataPoint<T> {
        DataPoint {
            input,
            expected,
            output: Matrix::default(),
            label: None,
        }
    }

    /// Convenience constructor from plain feature / target vectors.
    pub fn from_values(input: Vec<T>, expected: Vec<T>) -> DataPoint<T> {
        DataPoint::new(Matrix::row(input), Matrix::row(expected))
    }

    pub fn with_label(mut self, label: usize) -> DataPoint<T> {
        self.label = Some(label);
        self
    }
}
