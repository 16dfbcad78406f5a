use ndarray::Array2;

use super::{check_shapes, LossFunction};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct MseLoss;

impl LossFunction for MseLoss {
    fn name(&self) -> &'static str {
        "Mean Squared Error"
    }

    /// Scalar MSE: mean((predicted - expected)²) over every element.
    fn forward(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<f64> {
        check_shapes(predicted, expected)?;
        Ok((predicted - expected).mapv(|d| d * d).mean().unwrap_or(0.0))
    }

    /// (2 / N) · (predicted - expected)
    fn derivative(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<Array2<f64>> {
        check_shapes(predicted, expected)?;
        let n = predicted.len().max(1) as f64;
        Ok((predicted - expected) * (2.0 / n))
    }
}
