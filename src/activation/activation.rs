use serde::{Serialize, Deserialize};
use std::f64::consts::E;

use crate::error::{NetworkError, Result};
use crate::math::matrix::Matrix;

/// Activation strategies a layer can apply to its weighted input.
///
/// The variant doubles as the persisted kind code (`0` Sigmoid, `1` ReLU,
/// `2` Softmax), so dispatch and serialization can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    /// Treats the whole matrix as one flat vector, not row by row.
    Softmax,
}

impl ActivationFunction {
    pub fn activate(&self, input: &Matrix) -> Matrix {
        match self {
            ActivationFunction::Sigmoid => input.map(sigmoid),
            ActivationFunction::ReLU => input.map(|x| if x > 0.0 { x } else { 0.0 }),
            ActivationFunction::Softmax => {
                let exp_sum = exp_sum(input);
                input.map(|x| E.powf(x) / exp_sum)
            }
        }
    }

    /// Derivative evaluated at the pre-activation input `z`.
    ///
    /// Softmax returns the diagonal term `(e_i·S − e_i²) / S²` per element
    /// rather than the full Jacobian.
    pub fn derivative(&self, input: &Matrix) -> Matrix {
        match self {
            ActivationFunction::Sigmoid => input.map(|x| {
                let s = sigmoid(x);
                s * (1.0 - s)
            }),
            // x == 0 maps to 0
            ActivationFunction::ReLU => input.map(|x| if x > 0.0 { 1.0 } else { 0.0 }),
            ActivationFunction::Softmax => {
                let sum = exp_sum(input);
                input.map(|x| {
                    let ex = E.powf(x);
                    (ex * sum - ex * ex) / (sum * sum)
                })
            }
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            ActivationFunction::Sigmoid => 0,
            ActivationFunction::ReLU => 1,
            ActivationFunction::Softmax => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<ActivationFunction> {
        match code {
            0 => Ok(ActivationFunction::Sigmoid),
            1 => Ok(ActivationFunction::ReLU),
            2 => Ok(ActivationFunction::Softmax),
            other => Err(NetworkError::UnknownActivation(other)),
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + E.powf(-x))
}

fn exp_sum(input: &Matrix) -> f64 {
    input.iter().map(|&v| E.powf(v)).sum()
}
