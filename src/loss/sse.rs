use ndarray::Array2;

use super::{check_shapes, LossFunction};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct SseLoss;

impl LossFunction for SseLoss {
    fn name(&self) -> &'static str {
        "Sum of Squared Errors"
    }

    /// 0.5 · Σ (predicted − expected)²
    fn forward(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<f64> {
        check_shapes(predicted, expected)?;
        Ok(0.5 * (predicted - expected).mapv(|d| d * d).sum())
    }

    /// predicted − expected
    fn derivative(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<Array2<f64>> {
        check_shapes(predicted, expected)?;
        Ok(predicted - expected)
    }
}
