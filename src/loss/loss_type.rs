use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{BceLoss, CrossEntropyLoss, LossFunction, MaeLoss, MseLoss, SseLoss};
use crate::error::{NnError, Result};

/// Selects which loss function a training run uses.
///
/// - `Sse`                     — Sum of squared errors; pair with Sigmoid or Identity output.
/// - `Mse`                     — Mean-squared error; pair with Identity or Sigmoid output.
/// - `Mae`                     — Mean absolute error; pair with Identity output.
/// - `BinaryCrossEntropy`      — Binary cross-entropy; pair with Sigmoid output.
/// - `CategoricalCrossEntropy` — Categorical cross-entropy; pair with Softmax output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Sse,
    Mse,
    Mae,
    BinaryCrossEntropy,
    CategoricalCrossEntropy,
}

impl LossType {
    pub const ALL: [LossType; 5] = [
        LossType::Sse,
        LossType::Mse,
        LossType::Mae,
        LossType::BinaryCrossEntropy,
        LossType::CategoricalCrossEntropy,
    ];

    fn function(&self) -> &'static dyn LossFunction {
        match self {
            LossType::Sse => &SseLoss,
            LossType::Mse => &MseLoss,
            LossType::Mae => &MaeLoss,
            LossType::BinaryCrossEntropy => &BceLoss,
            LossType::CategoricalCrossEntropy => &CrossEntropyLoss,
        }
    }

    fn short_name(&self) -> &'static str {
        match self {
            LossType::Sse => "SSE",
            LossType::Mse => "MSE",
            LossType::Mae => "MAE",
            LossType::BinaryCrossEntropy => "BCE",
            LossType::CategoricalCrossEntropy => "CCE",
        }
    }
}

impl LossFunction for LossType {
    fn name(&self) -> &'static str {
        self.function().name()
    }

    fn forward(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<f64> {
        self.function().forward(predicted, expected)
    }

    fn derivative(&self, predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<Array2<f64>> {
        self.function().derivative(predicted, expected)
    }
}

impl fmt::Display for LossType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts either the full name ("Mean Squared Error") or the short one ("MSE").
impl FromStr for LossType {
    type Err = NnError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        LossType::ALL
            .into_iter()
            .find(|l| {
                l.name().eq_ignore_ascii_case(wanted) || l.short_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| NnError::config(format!("unknown loss function '{s}'")))
    }
}
