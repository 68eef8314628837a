use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::Result;
use crate::loss::cost::Cost;
use crate::network::network::{validate_layer_sizes, Network};

/// Seed used when a config does not name one.
pub const DEFAULT_SEED: u64 = 4252452;

/// How freshly built layers are initialised.
///
/// - `initial_bias` — constant every bias starts at
/// - `weight_min`, `weight_max` — uniform sampling range, before the
///   1/sqrt(fan_in) scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightInit {
    pub initial_bias: f64,
    pub weight_min: f64,
    pub weight_max: f64,
}

impl Default for WeightInit {
    fn default() -> Self {
        WeightInit {
            initial_bias: 0.0,
            weight_min: -1.0,
            weight_max: 1.0,
        }
    }
}

/// A fully serializable description of a network architecture, its cost
/// function and its initialisation.
///
/// `NetworkConfig` can be saved to / loaded from JSON independently of the
/// trained weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Node count per layer, input first.
    pub layer_sizes: Vec<usize>,
    #[serde(default = "default_activation")]
    pub hidden_activation: ActivationFunction,
    #[serde(default = "default_activation")]
    pub output_activation: ActivationFunction,
    #[serde(default)]
    pub cost: Cost,
    #[serde(default)]
    pub init: WeightInit,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_activation() -> ActivationFunction {
    ActivationFunction::Sigmoid
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl NetworkConfig {
    /// Sigmoid everywhere, MSE cost, default initialisation and seed.
    pub fn new(layer_sizes: Vec<usize>) -> Self {
        NetworkConfig {
            layer_sizes,
            hidden_activation: default_activation(),
            output_activation: default_activation(),
            cost: Cost::default(),
            init: WeightInit::default(),
            seed: DEFAULT_SEED,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_layer_sizes(&self.layer_sizes)
    }

    /// Builds the network from a generator seeded with `self.seed`.
    pub fn build(&self) -> Result<Network> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.build_with_rng(&mut rng)
    }

    pub fn build_with_rng<R: Rng>(&self, rng: &mut R) -> Result<Network> {
        self.validate()?;
        Network::with_init(
            self.layer_sizes.clone(),
            self.cost,
            self.hidden_activation,
            self.output_activation,
            &self.init,
            rng,
        )
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkConfig` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: NetworkConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}
