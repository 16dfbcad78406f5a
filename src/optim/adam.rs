use ndarray::{Array, Dimension, Zip};

use crate::layers::dense::ParamsMut;
use crate::optim::state::OptimizerState;

pub const DEFAULT_BETA1: f64 = 0.9;
pub const DEFAULT_BETA2: f64 = 0.999;
pub const DEFAULT_EPSILON: f64 = 1e-7;

/// Adam (adaptive moment estimation).
///
/// The timestep `t` is shared by every layer of the network the optimizer is
/// driving and advances once per `Optimizer::step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    /// Must be > 0; keeps the update finite when the second moment is zero.
    pub epsilon: f64,
    t: u64,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam::with_params(learning_rate, DEFAULT_BETA1, DEFAULT_BETA2, DEFAULT_EPSILON)
    }

    pub fn with_params(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Adam {
        Adam { learning_rate, beta1, beta2, epsilon, t: 0 }
    }

    pub fn timestep(&self) -> u64 {
        self.t
    }

    pub(crate) fn advance(&mut self) {
        self.t += 1;
    }

    /// Resets the layer's moment estimates to zero, discarding any left over
    /// from an earlier run.
    pub(crate) fn prepare(&self, state: &mut OptimizerState, dim: (usize, usize)) {
        *state = OptimizerState::moments(dim);
    }

    pub(crate) fn update(&self, p: ParamsMut<'_>) {
        if !matches!(p.state, OptimizerState::Moments { .. }) {
            self.prepare(p.state, p.weights.dim());
        }
        if let OptimizerState::Moments { m_weights, v_weights, m_bias, v_bias } = p.state {
            self.update_tensor(p.weights, m_weights, v_weights, p.grad_weights);
            if p.bias_enabled {
                self.update_tensor(p.bias, m_bias, v_bias, p.grad_bias);
            }
        }
    }

    fn update_tensor<D: Dimension>(
        &self,
        param: &mut Array<f64, D>,
        m: &mut Array<f64, D>,
        v: &mut Array<f64, D>,
        grad: &Array<f64, D>,
    ) {
        let (beta1, beta2, t) = (self.beta1, self.beta2, self.t);
        let (lr, eps) = (self.learning_rate, self.epsilon);
        Zip::from(param).and(m).and(v).and(grad).for_each(|p, m, v, &g| {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            let m_hat = bias_corrected(*m, beta1, t);
            let v_hat = bias_corrected(*v, beta2, t);
            *p -= lr * m_hat / (v_hat.sqrt() + eps);
        });
    }
}

/// `moment / (1 - beta^t)`
pub(crate) fn bias_corrected(moment: f64, beta: f64, t: u64) -> f64 {
    let t = i32::try_from(t).unwrap_or(i32::MAX);
    moment / (1.0 - beta.powi(t))
}
