use crate::layers::dense::ParamsMut;
use crate::optim::state::OptimizerState;

/// SGD with momentum:
///   velocity = momentum * velocity + lr * grad
///   param   -= velocity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum {
    pub learning_rate: f64,
    pub momentum: f64,
}

impl Momentum {
    pub fn new(learning_rate: f64, momentum: f64) -> Momentum {
        Momentum { learning_rate, momentum }
    }

    /// Resets the layer's velocities to zero.
    pub(crate) fn prepare(&self, state: &mut OptimizerState, dim: (usize, usize)) {
        *state = OptimizerState::velocity(dim);
    }

    pub(crate) fn update(&self, p: ParamsMut<'_>) {
        if !matches!(p.state, OptimizerState::Velocity { .. }) {
            self.prepare(p.state, p.weights.dim());
        }
        if let OptimizerState::Velocity { weights: vw, bias: vb } = p.state {
            *vw *= self.momentum;
            vw.scaled_add(self.learning_rate, p.grad_weights);
            *p.weights -= &*vw;
            if p.bias_enabled {
                *vb *= self.momentum;
                vb.scaled_add(self.learning_rate, p.grad_bias);
                *p.bias -= &*vb;
            }
        }
    }
}
