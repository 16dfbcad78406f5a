use crate::layers::dense::ParamsMut;

/// Plain gradient descent: `param -= lr * grad`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    pub(crate) fn update(&self, p: ParamsMut<'_>) {
        p.weights.scaled_add(-self.learning_rate, p.grad_weights);
        if p.bias_enabled {
            p.bias.scaled_add(-self.learning_rate, p.grad_bias);
        }
    }
}
