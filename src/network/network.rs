use log::{debug, trace};
use rand::Rng;

use crate::{activation::activation::ActivationFunction, layers::dense::{Layer, LayerPass}};
use crate::data::data_point::DataPoint;
use crate::error::{NetworkError, Result};
use crate::loss::cost::Cost;
use crate::math::matrix::Matrix;
use crate::network::spec::WeightInit;
use crate::optim::sgd::Sgd;

/// Per-layer results of one `Network::feed`, consumed by `Network::backpropagate`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardPass {
    layers: Vec<LayerPass>,
}

impl ForwardPass {
    /// The network's prediction (output of the last layer).
    pub fn output(&self) -> &Matrix {
        // feed always records at least the input and output layers
        &self.layers[self.layers.len() - 1].output
    }

    pub fn into_output(mut self) -> Matrix {
        self.layers.pop().map(|pass| pass.output).unwrap_or_default()
    }

    pub fn layer(&self, index: usize) -> Option<&LayerPass> {
        self.layers.get(index)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// A fully connected feedforward network trained with mini-batch gradient descent.
///
/// Layer 0 is the parameterless input layer. Hidden layers use the hidden
/// activation, the last layer uses the output activation.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    weight_grads: Vec<Matrix>,
    bias_grads: Vec<Matrix>,
    hidden: ActivationFunction,
    output: ActivationFunction,
    cost: Cost,
    layer_sizes: Vec<usize>,
}

impl Network {
    /// Builds a network with zero biases and weights drawn from U[-1, 1) / sqrt(fan_in).
    pub fn new<R: Rng>(
        layer_sizes: Vec<usize>,
        cost: Cost,
        hidden: ActivationFunction,
        output: ActivationFunction,
        rng: &mut R,
    ) -> Result<Network> {
        Network::with_init(layer_sizes, cost, hidden, output, &WeightInit::default(), rng)
    }

    pub fn with_init<R: Rng>(
        layer_sizes: Vec<usize>,
        cost: Cost,
        hidden: ActivationFunction,
        output: ActivationFunction,
        init: &WeightInit,
        rng: &mut R,
    ) -> Result<Network> {
        validate_layer_sizes(&layer_sizes)?;

        let mut layers = Vec::with_capacity(layer_sizes.len());
        layers.push(Layer::input(layer_sizes[0]));
        for pair in layer_sizes.windows(2) {
            let (input_size, size) = (pair[0], pair[1]);
            let biases = Matrix::filled(1, size, init.initial_bias);
            layers.push(Layer::new(input_size, biases, size, (init.weight_min, init.weight_max), rng)?);
        }

        Network::from_layers(layer_sizes, layers, hidden, output, cost)
    }

    /// Assembles a network from already built layers; gradients start at zero.
    pub(crate) fn from_layers(
        layer_sizes: Vec<usize>,
        layers: Vec<Layer>,
        hidden: ActivationFunction,
        output: ActivationFunction,
        cost: Cost,
    ) -> Result<Network> {
        validate_layer_sizes(&layer_sizes)?;
        if layers.len() != layer_sizes.len() {
            return Err(NetworkError::InvalidConfig(format!(
                "{} layers given for {} layer sizes",
                layers.len(),
                layer_sizes.len()
            )));
        }

        let mut network = Network {
            layers,
            weight_grads: Vec::new(),
            bias_grads: Vec::new(),
            hidden,
            output,
            cost,
            layer_sizes,
        };
        network.clear_gradients();
        Ok(network)
    }

    /// Replaces the cost strategy (loaded networks default to MSE).
    pub fn with_cost(mut self, cost: Cost) -> Network {
        self.cost = cost;
        self
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Replaces the weights of layer `index`, keeping its shape.
    pub fn set_layer_weights(&mut self, index: usize, weights: Matrix) -> Result<()> {
        self.layer_mut(index)?.set_weights(weights)
    }

    /// Replaces the biases of layer `index`, keeping its shape.
    pub fn set_layer_biases(&mut self, index: usize, biases: Matrix) -> Result<()> {
        self.layer_mut(index)?.set_biases(biases)
    }

    fn layer_mut(&mut self, index: usize) -> Result<&mut Layer> {
        let len = self.layers.len();
        self.layers.get_mut(index).ok_or(NetworkError::IndexOutOfRange { what: "layer", index, len })
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn hidden_activation(&self) -> ActivationFunction {
        self.hidden
    }

    pub fn output_activation(&self) -> ActivationFunction {
        self.output
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn weight_gradients(&self) -> &[Matrix] {
        &self.weight_grads
    }

    pub fn bias_gradients(&self) -> &[Matrix] {
        &self.bias_grads
    }

    /// Forward pass for a single 1×inputs sample.
    pub fn feed(&self, input: &Matrix) -> Result<ForwardPass> {
        let expected = (1, self.layer_sizes[0]);
        if input.shape() != expected {
            return Err(NetworkError::ShapeMismatch {
                op: "feed",
                left: input.shape(),
                right: expected,
            });
        }

        let last = self.layers.len() - 1;
        let mut passes = Vec::with_capacity(self.layers.len());
        // the activation handed to the input layer is ignored
        passes.push(self.layers[0].forward(input, self.hidden, true)?);
        for (i, layer) in self.layers.iter().enumerate().skip(1) {
            let activation = if i == last { self.output } else { self.hidden };
            let pass = layer.forward(&passes[i - 1].output, activation, false)?;
            passes.push(pass);
        }

        Ok(ForwardPass { layers: passes })
    }

    /// Stores the prediction for `point.input` in `point.output`.
    pub fn calculate_outputs(&self, point: &mut DataPoint) -> Result<()> {
        point.output = self.feed(&point.input)?.into_output();
        Ok(())
    }

    pub fn calculate_batch_outputs(&self, batch: &mut [DataPoint]) -> Result<()> {
        for point in batch.iter_mut() {
            self.calculate_outputs(point)?;
        }
        Ok(())
    }

    /// One gradient step over `batch`.
    ///
    /// Gradients are summed over the batch, not averaged; scale `learn_rate`
    /// by 1/batch_size for the mean. Every point's `output` is refreshed as a
    /// side effect. Accumulators are zero again when this returns, even on error.
    pub fn learn(&mut self, batch: &mut [DataPoint], learn_rate: f64) -> Result<()> {
        debug!("learn: {} points, learn rate {}", batch.len(), learn_rate);

        self.clear_gradients();
        let result = self
            .accumulate_batch(batch)
            .and_then(|_| self.apply_gradients(learn_rate));
        self.clear_gradients();
        result
    }

    fn accumulate_batch(&mut self, batch: &mut [DataPoint]) -> Result<()> {
        for point in batch.iter_mut() {
            let pass = self.feed(&point.input)?;
            point.output = pass.output().clone();
            self.backpropagate(&pass, point)?;
        }
        Ok(())
    }

    /// Adds the gradients of one sample to the accumulators.
    ///
    /// `pass` must come from `feed(&point.input)` on this network and
    /// `point.output` must hold that pass's output.
    pub fn backpropagate(&mut self, pass: &ForwardPass, point: &DataPoint) -> Result<()> {
        let n = self.layers.len();
        if pass.len() != n {
            return Err(NetworkError::ShapeMismatch {
                op: "backpropagate",
                left: (pass.len(), 1),
                right: (n, 1),
            });
        }

        let mut error = self.output
            .derivative(&pass.layers[n - 1].weighted_input)
            .hadamard(&self.cost.point_derivative(point)?)?;
        self.accumulate(n - 1, &error, &pass.layers[n - 2].output)?;

        // stops before the input layer, which owns no parameters
        for i in (1..n - 1).rev() {
            error = error
                .multiply(&self.layers[i + 1].weights().transpose())?
                .hadamard(&self.hidden.derivative(&pass.layers[i].weighted_input))?;
            trace!("backpropagate: layer {i} error {:?}", error.as_slice());
            self.accumulate(i, &error, &pass.layers[i - 1].output)?;
        }

        Ok(())
    }

    fn accumulate(&mut self, layer: usize, error: &Matrix, previous_output: &Matrix) -> Result<()> {
        self.bias_grads[layer].add_assign(error)?;
        let weight_grad = previous_output.transpose().multiply(error)?;
        self.weight_grads[layer].add_assign(&weight_grad)
    }

    /// Subtracts `accumulated gradient × learn_rate` from every layer's parameters.
    pub fn apply_gradients(&mut self, learn_rate: f64) -> Result<()> {
        let optimizer = Sgd::new(learn_rate);
        for i in 1..self.layers.len() {
            optimizer.step(&mut self.layers[i], &self.weight_grads[i], &self.bias_grads[i])?;
        }
        Ok(())
    }

    /// Resets every accumulator to zeros shaped like its layer's parameters.
    pub fn clear_gradients(&mut self) {
        self.weight_grads = self.layers.iter()
            .map(|layer| Matrix::zeros(layer.weights().rows(), layer.weights().cols()))
            .collect();
        self.bias_grads = self.layers.iter()
            .map(|layer| Matrix::zeros(layer.biases().rows(), layer.biases().cols()))
            .collect();
    }
}

pub(crate) fn validate_layer_sizes(layer_sizes: &[usize]) -> Result<()> {
    if layer_sizes.len() < 2 {
        return Err(NetworkError::InvalidConfig(format!(
            "a network needs at least an input and an output layer, got {} layer sizes",
            layer_sizes.len()
        )));
    }
    if let Some(i) = layer_sizes.iter().position(|&size| size == 0) {
        return Err(NetworkError::InvalidConfig(format!("layer {i} has zero nodes")));
    }
    if let Some(pair) = layer_sizes.windows(2).find(|pair| pair[0].checked_mul(pair[1]).is_none()) {
        return Err(NetworkError::InvalidConfig(format!(
            "a {}x{} weight matrix is too large",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn network(sizes: Vec<usize>, hidden: ActivationFunction, output: ActivationFunction) -> Network {
        let mut rng = StdRng::seed_from_u64(42);
        Network::new(sizes, Cost::Mse, hidden, output, &mut rng).unwrap()
    }

    fn sample() -> DataPoint {
        DataPoint::from_values(vec![0.8, -0.3], vec![1.0, 0.0])
    }

    #[test]
    fn construction_shapes() {
        let net = network(vec![2, 3, 4, 2], ActivationFunction::Sigmoid, ActivationFunction::Sigmoid);
        let shapes: Vec<_> = net.layers().iter().map(|l| l.weights().shape()).collect();
        assert_eq!(shapes, vec![(0, 0), (2, 3), (3, 4), (4, 2)]);
        assert_eq!(net.layers()[2].biases().shape(), (1, 4));
        assert!(net.weight_gradients().iter().all(|g| g.iter().all(|&v| v == 0.0)));
        assert_eq!(net.weight_gradients()[3].shape(), (4, 2));
    }

    #[test]
    fn rejects_degenerate_layer_sizes() {
        let mut rng = StdRng::seed_from_u64(0);
        let s = ActivationFunction::Sigmoid;
        assert!(Network::new(vec![3], Cost::Mse, s, s, &mut rng).is_err());
        assert!(Network::new(vec![3, 0, 1], Cost::Mse, s, s, &mut rng).is_err());
        assert!(matches!(
            Network::new(vec![usize::MAX, 2], Cost::Mse, s, s, &mut rng),
            Err(NetworkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn feed_records_every_layer() {
        let net = network(vec![2, 3, 2], ActivationFunction::ReLU, ActivationFunction::Softmax);
        let x = Matrix::row(vec![0.5, 0.25]);
        let pass = net.feed(&x).unwrap();
        assert_eq!(pass.len(), 3);
        assert_eq!(pass.layer(0).unwrap().output, x);
        assert!(pass.layer(1).unwrap().output.iter().all(|&v| v >= 0.0));
        let total: f64 = pass.output().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);

        assert!(net.feed(&Matrix::row(vec![1.0, 2.0, 3.0])).is_err());
    }

    #[test]
    fn calculate_outputs_does_not_touch_parameters() {
        let net = network(vec![2, 3, 2], ActivationFunction::Sigmoid, ActivationFunction::Sigmoid);
        let before = net.layers().to_vec();
        let mut batch = vec![sample(), sample()];
        net.calculate_batch_outputs(&mut batch).unwrap();
        assert_eq!(batch[0].output.shape(), (1, 2));
        assert_eq!(batch[0].output, batch[1].output);
        assert_eq!(net.layers(), before.as_slice());
    }

    #[test]
    fn zero_learn_rate_leaves_parameters_unchanged() {
        let mut net = network(vec![2, 3, 2], ActivationFunction::Sigmoid, ActivationFunction::Sigmoid);
        let before = net.layers().to_vec();
        let mut batch = vec![sample()];
        net.learn(&mut batch, 0.0).unwrap();
        assert_eq!(net.layers(), before.as_slice());
        assert_eq!(batch[0].output.shape(), (1, 2));
    }

    #[test]
    fn gradients_are_cleared_after_learn() {
        let mut net = network(vec![2, 3, 2], ActivationFunction::Sigmoid, ActivationFunction::Sigmoid);
        net.learn(&mut [sample()], 0.1).unwrap();
        assert!(net.weight_gradients().iter().chain(net.bias_gradients()).all(|g| g.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn gradients_are_summed_over_the_batch() {
        let mut once = network(vec![2, 2], ActivationFunction::Sigmoid, ActivationFunction::Sigmoid);
        let mut twice = once.clone();

        once.learn(&mut [sample()], 0.2).unwrap();
        // two identical points at half the rate move parameters the same way
        twice.learn(&mut [sample(), sample()], 0.1).unwrap();

        for (a, b) in once.layers()[1].weights().iter().zip(twice.layers()[1].weights().iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn backpropagate_matches_finite_differences() {
        let mut net = network(vec![2, 3, 2], ActivationFunction::Sigmoid, ActivationFunction::Sigmoid);
        let mut point = sample();
        let pass = net.feed(&point.input).unwrap();
        point.output = pass.output().clone();
        net.backpropagate(&pass, &point).unwrap();
        let analytic = net.weight_gradients()[1].get(0, 1).unwrap();

        let cost_at = |net: &Network| {
            let mut p = sample();
            net.calculate_outputs(&mut p).unwrap();
            Cost::Mse.point_cost(&p).unwrap()
        };
        let h = 1e-6;
        let mut plus = net.clone();
        let mut w = plus.layers()[1].weights().clone();
        w.set(0, 1, w.get(0, 1).unwrap() + h).unwrap();
        plus.set_layer_weights(1, w).unwrap();
        let mut minus = net.clone();
        let mut w = minus.layers()[1].weights().clone();
        w.set(0, 1, w.get(0, 1).unwrap() - h).unwrap();
        minus.set_layer_weights(1, w).unwrap();

        let numeric = (cost_at(&plus) - cost_at(&minus)) / (2.0 * h);
        assert!((analytic - numeric).abs() < 1e-6, "analytic {analytic} numeric {numeric}");
    }

    #[test]
    fn layer_setters_keep_the_network_loadable() {
        let mut net = network(vec![2, 3, 2], ActivationFunction::Sigmoid, ActivationFunction::Sigmoid);
        assert!(net.set_layer_weights(1, Matrix::zeros(3, 3)).is_err());
        assert!(net.set_layer_biases(2, Matrix::zeros(1, 3)).is_err());
        assert!(net.set_layer_weights(0, Matrix::zeros(2, 3)).is_err());
        assert!(matches!(
            net.set_layer_biases(3, Matrix::zeros(1, 2)),
            Err(NetworkError::IndexOutOfRange { what: "layer", index: 3, len: 3 })
        ));

        net.set_layer_weights(1, Matrix::filled(2, 3, 0.25)).unwrap();
        net.set_layer_biases(2, Matrix::filled(1, 2, -1.0)).unwrap();
        assert_eq!(net.layer_sizes(), &[2, 3, 2]);
        assert_eq!(net.layers()[1].size(), 3);

        let restored = Network::from_text(&net.to_text()).unwrap();
        assert_eq!(restored.layers(), net.layers());
    }

    #[test]
    fn one_step_on_a_single_neuron_lowers_the_cost() {
        let mut rng = StdRng::seed_from_u64(3);
        let s = ActivationFunction::Sigmoid;
        let mut net = Network::new(vec![1, 1], Cost::Mse, s, s, &mut rng).unwrap();
        let mut batch = vec![DataPoint::from_values(vec![1.0], vec![1.0])];

        net.calculate_batch_outputs(&mut batch).unwrap();
        let before = Cost::Mse.point_cost(&batch[0]).unwrap();
        net.learn(&mut batch, 0.1).unwrap();
        net.calculate_batch_outputs(&mut batch).unwrap();
        let after = Cost::Mse.point_cost(&batch[0]).unwrap();

        assert!(after < before, "cost went from {before} to {after}");
    }

    #[test]
    fn backpropagate_rejects_foreign_pass() {
        let small = network(vec![2, 2], ActivationFunction::Sigmoid, ActivationFunction::Sigmoid);
        let mut big = network(vec![2, 3, 2], ActivationFunction::Sigmoid, ActivationFunction::Sigmoid);
        let mut point = sample();
        let pass = small.feed(&point.input).unwrap();
        point.output = pass.output().clone();
        assert!(big.backpropagate(&pass, &point).is_err());
    }
}
