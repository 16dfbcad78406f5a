pub mod epoch_stats;
pub mod loop_fn;
pub mod session;

pub use epoch_stats::EpochStats;
pub use loop_fn::{evaluate, train, GradientLog, TrainingReport};
pub use session::{BatchMode, GradientCapture, TrainingSession};
