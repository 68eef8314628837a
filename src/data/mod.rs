pub mod data_point;

pub use data_point::DataPoint;
