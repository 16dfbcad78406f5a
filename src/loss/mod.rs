pub mod bce;
pub mod cross_entropy;
pub mod loss_type;
pub mod mae;
pub mod mse;
pub mod sse;

use ndarray::Array2;

use crate::error::{NnError, Result};

pub use bce::BceLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use loss_type::LossType;
pub use mae::MaeLoss;
pub use mse::MseLoss;
pub use sse::SseLoss;

/// Probabilities fed to the cross-entropy losses are clipped to `[EPS, 1 - EPS]`.
pub const EPS: f64 = 1e-12;

/// A scalar loss over a batch and its gradient w.r.t. the predictions.
pub trait LossFunction {
    fn name(&self) -> &'static str;

    fn forward(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<f64>;

    /// Same shape as `predicted`.
    fn derivative(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<Array2<f64>>;
}

pub(crate) fn check_shapes(predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<()> {
    NnError::check_dim("loss inputs", predicted.dim(), expected.dim())
}

pub(crate) fn clip(p: f64) -> f64 {
    p.clamp(EPS, 1.0 - EPS)
}
