use rand::Rng;

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};
use crate::error::{NetworkError, Result};

/// What one layer produced during a forward pass. The backward pass reads it
/// instead of state hidden inside the layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerPass {
    /// Pre-activation values z = xW + b (the raw input for the input layer).
    pub weighted_input: Matrix,
    pub output: Matrix,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    size: usize,
    weights: Matrix, // input_size x size, empty for the input layer
    biases: Matrix,  // 1 x size, empty for the input layer
}

impl Layer {
    /// The parameterless input layer.
    pub fn input(size: usize) -> Layer {
        Layer {
            size,
            weights: Matrix::default(),
            biases: Matrix::default(),
        }
    }

    /// A parameterised layer fed by `input_size` nodes.
    ///
    /// Every weight is drawn from U[`weight_min`, `weight_max`) and divided
    /// by sqrt(`input_size`), in row-major order.
    pub fn new<R: Rng>(
        input_size: usize,
        biases: Matrix,
        size: usize,
        (weight_min, weight_max): (f64, f64),
        rng: &mut R,
    ) -> Result<Layer> {
        if biases.shape() != (1, size) {
            return Err(NetworkError::ShapeMismatch {
                op: "layer biases",
                left: biases.shape(),
                right: (1, size),
            });
        }
        if weight_min >= weight_max || !weight_min.is_finite() || !weight_max.is_finite() {
            return Err(NetworkError::InvalidConfig(format!(
                "weight range [{weight_min}, {weight_max}) is empty or not finite"
            )));
        }

        let fan_in = (input_size as f64).sqrt();
        let weights = Matrix::<f64>::random_uniform(input_size, size, weight_min, weight_max, rng)
            .map(|w| w / fan_in);

        Ok(Layer { size, weights, biases })
    }

    /// Builds a layer from already trained parameters.
    pub fn from_parameters(weights: Matrix, biases: Matrix) -> Result<Layer> {
        if biases.rows() != 1 || biases.cols() != weights.cols() {
            return Err(NetworkError::ShapeMismatch {
                op: "layer biases",
                left: biases.shape(),
                right: (1, weights.cols()),
            });
        }
        Ok(Layer { size: weights.cols(), weights, biases })
    }

    /// One forward step. The input layer passes `input` through untouched and
    /// ignores `activation`.
    pub fn forward(&self, input: &Matrix, activation: ActivationFunction, is_input_layer: bool) -> Result<LayerPass> {
        if is_input_layer {
            return Ok(LayerPass {
                weighted_input: input.clone(),
                output: input.clone(),
            });
        }

        let z = input.multiply(&self.weights)?.add(&self.biases)?;
        let a = activation.activate(&z);
        Ok(LayerPass { weighted_input: z, output: a })
    }

    /// Node count.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &Matrix {
        &self.biases
    }

    /// Replaces the weights; the new matrix must keep the current shape.
    pub fn set_weights(&mut self, weights: Matrix) -> Result<()> {
        if weights.shape() != self.weights.shape() {
            return Err(NetworkError::ShapeMismatch {
                op: "set_weights",
                left: self.weights.shape(),
                right: weights.shape(),
            });
        }
        self.weights = weights;
        Ok(())
    }

    /// Replaces the biases; the new matrix must keep the current shape.
    pub fn set_biases(&mut self, biases: Matrix) -> Result<()> {
        if biases.shape() != self.biases.shape() {
            return Err(NetworkError::ShapeMismatch {
                op: "set_biases",
                left: self.biases.shape(),
                right: biases.shape(),
            });
        }
        self.biases = biases;
        Ok(())
    }

    /// Applies pre-computed gradients scaled by lr.
    pub fn apply_gradients(&mut self, weights_grad: &Matrix, biases_grad: &Matrix, lr: f64) -> Result<()> {
        self.weights = self.weights.sub(&weights_grad.scale(lr))?;
        self.biases = self.biases.sub(&biases_grad.scale(lr))?;
        Ok(())
    }
}
