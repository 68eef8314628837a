pub mod trainer;
pub mod epoch_stats;
pub mod train_config;
pub mod accuracy;

pub use trainer::Trainer;
pub use epoch_stats::EpochStats;
pub use train_config::TrainConfig;
pub use accuracy::accuracy;
