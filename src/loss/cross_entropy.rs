use ndarray::{Array2, Zip};

use super::{check_shapes, clip, LossFunction};
use crate::error::Result;

/// Categorical cross-entropy over one-hot (or soft) targets.
///
/// The gradient is taken w.r.t. the probabilities themselves, so it is not
/// the fused `p - y` shortcut used when softmax and cross-entropy are
/// differentiated together.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyLoss;

impl LossFunction for CrossEntropyLoss {
    fn name(&self) -> &'static str {
        "Categorical Cross Entropy"
    }

    /// L = -Σ expected · ln(clip(predicted))
    fn forward(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<f64> {
        check_shapes(predicted, expected)?;
        Ok(Zip::from(predicted)
            .and(expected)
            .fold(0.0, |acc, &p, &y| acc - y * clip(p).ln()))
    }

    /// -expected / clip(predicted)
    fn derivative(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<Array2<f64>> {
        check_shapes(predicted, expected)?;
        Ok(Zip::from(predicted)
            .and(expected)
            .map_collect(|&p, &y| -y / clip(p)))
    }
}
