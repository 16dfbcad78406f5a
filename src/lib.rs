pub mod activation;
pub mod data;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod metrics;
pub mod network;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use activation::ActivationFunction;
pub use data::{DataLoader, Dataset};
pub use error::{NnError, Result};
pub use layers::Layer;
pub use loss::{LossFunction, LossType};
pub use math::WeightInit;
pub use network::{LayerSpec, Network, NetworkSpec};
pub use optim::{Optimizer, OptimizerKind, OptimizerSettings};
pub use train::{evaluate, train, BatchMode, EpochStats, TrainingReport, TrainingSession};
