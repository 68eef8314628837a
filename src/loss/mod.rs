pub mod mse;
pub mod cross_entropy;
pub mod cost;

pub use mse::MseCost;
pub use cross_entropy::CrossEntropyCost;
pub use cost::Cost;
