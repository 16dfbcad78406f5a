use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::NnError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Identity,
    Sigmoid,
    ReLU,
    /// Heaviside step. Not differentiable; its derivative is taken as zero
    /// everywhere, so nothing upstream of a Step layer learns through it.
    Step,
    /// Row-wise softmax. Unlike the others it is vector-valued, see
    /// [`softmax_jacobian`] and [`ActivationFunction::backprop`].
    Softmax,
}

impl ActivationFunction {
    pub const ALL: [ActivationFunction; 5] = [
        ActivationFunction::Identity,
        ActivationFunction::Sigmoid,
        ActivationFunction::ReLU,
        ActivationFunction::Step,
        ActivationFunction::Softmax,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::Identity => "Identity",
            ActivationFunction::Sigmoid => "Sigmoid",
            ActivationFunction::ReLU => "ReLU",
            ActivationFunction::Step => "Step",
            ActivationFunction::Softmax => "Softmax",
        }
    }

    /// Applies the activation to a batch (one sample per row).
    pub fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        match self {
            ActivationFunction::Identity => x.clone(),
            ActivationFunction::Sigmoid => x.mapv(sigmoid),
            ActivationFunction::ReLU => x.mapv(|v| v.max(0.0)),
            ActivationFunction::Step => x.mapv(|v| if v >= 0.0 { 1.0 } else { 0.0 }),
            ActivationFunction::Softmax => {
                let mut out = x.clone();
                for mut row in out.axis_iter_mut(Axis(0)) {
                    let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
                    row.mapv_inplace(|v| (v - max).exp());
                    let sum = row.sum();
                    row.mapv_inplace(|v| v / sum);
                }
                out
            }
        }
    }

    /// Elementwise derivative expressed in terms of the activation's
    /// *output*, not its pre-activation input.
    ///
    /// For `Softmax` this is only the Jacobian diagonal `s(1-s)`; the full
    /// Jacobian is used by [`ActivationFunction::backprop`].
    pub fn derivative(&self, output: &Array2<f64>) -> Array2<f64> {
        match self {
            ActivationFunction::Identity => Array2::ones(output.dim()),
            ActivationFunction::Sigmoid | ActivationFunction::Softmax => {
                output.mapv(|o| o * (1.0 - o))
            }
            ActivationFunction::ReLU => output.mapv(|o| if o > 0.0 { 1.0 } else { 0.0 }),
            ActivationFunction::Step => Array2::zeros(output.dim()),
        }
    }

    /// Maps `dL/d(output)` to `dL/d(pre-activation)` for a batch.
    ///
    /// Elementwise activations multiply by [`ActivationFunction::derivative`].
    /// Softmax multiplies every row by that row's Jacobian.
    pub fn backprop(&self, delta: &Array2<f64>, output: &Array2<f64>) -> Array2<f64> {
        match self {
            ActivationFunction::Softmax => {
                let mut out = Array2::zeros(delta.dim());
                for ((d, s), mut o) in delta
                    .axis_iter(Axis(0))
                    .zip(output.axis_iter(Axis(0)))
                    .zip(out.axis_iter_mut(Axis(0)))
                {
                    // The softmax Jacobian is symmetric, so d·J == Jᵀ·d.
                    o.assign(&d.dot(&softmax_jacobian(s)));
                }
                out
            }
            _ => delta * &self.derivative(output),
        }
    }
}

/// Jacobian of softmax for one output row `s`: `diag(s) - s sᵀ`.
pub fn softmax_jacobian(s: ArrayView1<f64>) -> Array2<f64> {
    let col = s.insert_axis(Axis(1));
    Array2::from_diag(&s) - col.dot(&col.t())
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivationFunction {
    type Err = NnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ActivationFunction::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| NnError::config(format!("unknown activation function '{s}'")))
    }
}
