pub mod error;
pub mod math;
pub mod activation;
pub mod data;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use error::{NetworkError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use data::data_point::DataPoint;
pub use layers::dense::{Layer, LayerPass};
pub use network::network::{ForwardPass, Network};
pub use network::spec::{NetworkConfig, WeightInit};
pub use loss::cost::Cost;
pub use optim::sgd::Sgd;
pub use train::{accuracy, EpochStats, TrainConfig, Trainer};
