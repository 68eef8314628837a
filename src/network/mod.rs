pub mod network;
pub mod persist;
pub mod spec;

pub use network::{ForwardPass, Network};
pub use spec::{NetworkConfig, WeightInit, DEFAULT_SEED};
