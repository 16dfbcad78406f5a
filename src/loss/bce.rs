use ndarray::{Array2, Zip};

use super::{check_shapes, clip, LossFunction};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct BceLoss;

impl LossFunction for BceLoss {
    fn name(&self) -> &'static str {
        "Binary Cross Entropy"
    }

    /// -Σ (y·ln p + (1-y)·ln(1-p)), with p clipped to [ε, 1-ε]
    fn forward(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<f64> {
        check_shapes(predicted, expected)?;
        Ok(Zip::from(predicted).and(expected).fold(0.0, |acc, &p, &y| {
            let p = clip(p);
            acc - (y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        }))
    }

    /// -y/p + (1-y)/(1-p)
    fn derivative(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<Array2<f64>> {
        check_shapes(predicted, expected)?;
        Ok(Zip::from(predicted).and(expected).map_collect(|&p, &y| {
            let p = clip(p);
            -y / p + (1.0 - y) / (1.0 - p)
        }))
    }
}
