use ndarray::Array2;

use super::{check_shapes, LossFunction};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct MaeLoss;

impl LossFunction for MaeLoss {
    fn name(&self) -> &'static str {
        "Mean Absolute Error"
    }

    /// Scalar MAE: mean(|predicted - expected|)
    fn forward(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<f64> {
        check_shapes(predicted, expected)?;
        Ok((predicted - expected).mapv(f64::abs).mean().unwrap_or(0.0))
    }

    /// Subgradient: sign(p - y) / n  (0 when equal)
    fn derivative(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<Array2<f64>> {
        check_shapes(predicted, expected)?;
        let n = predicted.len().max(1) as f64;
        Ok((predicted - expected).mapv(|diff| {
            if diff > 0.0 {
                1.0 / n
            } else if diff < 0.0 {
                -1.0 / n
            } else {
                0.0
            }
        }))
    }
}
