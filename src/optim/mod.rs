pub mod adam;
pub mod momentum;
pub mod optimizer;
pub mod sgd;
pub mod state;

pub use adam::Adam;
pub use momentum::Momentum;
pub use optimizer::{Optimizer, OptimizerKind, OptimizerSettings, Phase, UpdateRule};
pub use sgd::Sgd;
pub use state::OptimizerState;
