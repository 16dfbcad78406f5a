use ndarray::{s, Array1, Array2, Axis};
use rand::Rng;

use crate::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::math::init::WeightInit;
use crate::optim::state::OptimizerState;

/// Fully connected layer: `activation(x · W + b)`.
///
/// Besides its parameters the layer keeps the input and output of the most
/// recent `forward` call (needed by `backward`), the gradients accumulated
/// since the last `zero_gradients`, and whatever auxiliary state the optimizer
/// attached to it.
#[derive(Debug, Clone)]
pub struct Layer {
    weights: Array2<f64>,
    /// Always the zero vector when `bias_enabled` is false.
    bias: Array1<f64>,
    bias_enabled: bool,
    activation: ActivationFunction,
    a_in: Option<Array2<f64>>,
    a_out: Option<Array2<f64>>,
    grad_weights: Array2<f64>,
    grad_bias: Array1<f64>,
    pub(crate) optim_state: OptimizerState,
}

impl Layer {
    pub fn new<R: Rng + ?Sized>(
        n_inputs: usize,
        n_outputs: usize,
        bias_enabled: bool,
        activation: ActivationFunction,
        init: WeightInit,
        rng: &mut R,
    ) -> Result<Layer> {
        if n_inputs == 0 || n_outputs == 0 {
            return Err(NnError::config(format!(
                "layer must have at least one input and one neuron (got {n_inputs} -> {n_outputs})"
            )));
        }
        let weights = init.weights(n_inputs, n_outputs, rng);
        let bias = if bias_enabled {
            Some(init.bias(n_inputs, n_outputs, rng))
        } else {
            None
        };
        Layer::from_parts(weights, bias, activation)
    }

    /// Builds a layer from explicit parameters. `bias: None` disables the bias.
    pub fn from_parts(
        weights: Array2<f64>,
        bias: Option<Array1<f64>>,
        activation: ActivationFunction,
    ) -> Result<Layer> {
        let (n_in, n_out) = weights.dim();
        if n_in == 0 || n_out == 0 {
            return Err(NnError::config("layer weight matrix must not be empty"));
        }
        let bias_enabled = bias.is_some();
        let bias = bias.unwrap_or_else(|| Array1::zeros(n_out));
        if bias.len() != n_out {
            return Err(NnError::config(format!(
                "bias has {} entries but the layer has {n_out} neurons",
                bias.len()
            )));
        }
        Ok(Layer {
            grad_weights: Array2::zeros((n_in, n_out)),
            grad_bias: Array1::zeros(n_out),
            weights,
            bias,
            bias_enabled,
            activation,
            a_in: None,
            a_out: None,
            optim_state: OptimizerState::Uninitialized,
        })
    }

    /// Caches `x` and the activated output, then returns the output.
    pub fn forward(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        NnError::check_dim("layer input", (x.nrows(), self.n_inputs()), x.dim())?;
        let z = x.dot(&self.weights) + &self.bias;
        let out = self.activation.forward(&z);
        self.a_in = Some(x.clone());
        self.a_out = Some(out.clone());
        Ok(out)
    }

    /// Accumulates parameter gradients for `delta_in` (dL/d output) and
    /// returns the delta for the previous layer.
    ///
    /// Gradients add up across calls until `zero_gradients`.
    pub fn backward(&mut self, delta_in: &Array2<f64>) -> Result<Array2<f64>> {
        let (a_in, a_out) = match (&self.a_in, &self.a_out) {
            (Some(a_in), Some(a_out)) => (a_in, a_out),
            _ => return Err(NnError::MissingForward),
        };
        NnError::check_dim("layer delta", a_out.dim(), delta_in.dim())?;

        let delta = self.activation.backprop(delta_in, a_out);
        self.grad_weights += &a_in.t().dot(&delta);
        if self.bias_enabled {
            self.grad_bias += &delta.sum_axis(Axis(0));
        }
        Ok(delta.dot(&self.weights.t()))
    }

    pub fn zero_gradients(&mut self) {
        self.grad_weights.fill(0.0);
        self.grad_bias.fill(0.0);
    }

    pub fn scale_gradients(&mut self, factor: f64) {
        self.grad_weights *= factor;
        self.grad_bias *= factor;
    }

    /// |grad_weights|, with |grad_bias| stacked beneath as an extra row when
    /// `stack_bias` is set and the layer has a bias.
    pub fn gradient_magnitudes(&self, stack_bias: bool) -> Array2<f64> {
        let grads = self.grad_weights.mapv(f64::abs);
        if !(stack_bias && self.bias_enabled) {
            return grads;
        }
        let (n_in, n_out) = grads.dim();
        let mut stacked = Array2::zeros((n_in + 1, n_out));
        stacked.slice_mut(s![..n_in, ..]).assign(&grads);
        stacked.row_mut(n_in).assign(&self.grad_bias.mapv(f64::abs));
        stacked
    }

    /// Parameters and their gradients, mutably, for optimizer updates.
    pub(crate) fn params_mut(&mut self) -> ParamsMut<'_> {
        ParamsMut {
            weights: &mut self.weights,
            bias: &mut self.bias,
            grad_weights: &self.grad_weights,
            grad_bias: &self.grad_bias,
            bias_enabled: self.bias_enabled,
            state: &mut self.optim_state,
        }
    }

    pub fn n_inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_outputs(&self) -> usize {
        self.weights.ncols()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn bias(&self) -> &Array1<f64> {
        &self.bias
    }

    pub fn bias_enabled(&self) -> bool {
        self.bias_enabled
    }

    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    pub fn grad_weights(&self) -> &Array2<f64> {
        &self.grad_weights
    }

    pub fn grad_bias(&self) -> &Array1<f64> {
        &self.grad_bias
    }

    /// Input of the most recent `forward` call. Overwritten by the next one.
    pub fn last_input(&self) -> Option<&Array2<f64>> {
        self.a_in.as_ref()
    }

    /// Output of the most recent `forward` call. Overwritten by the next one.
    pub fn last_output(&self) -> Option<&Array2<f64>> {
        self.a_out.as_ref()
    }

    pub fn optimizer_state(&self) -> &OptimizerState {
        &self.optim_state
    }
}

/// Split borrow of a layer handed to optimizer update rules.
pub(crate) struct ParamsMut<'a> {
    pub weights: &'a mut Array2<f64>,
    pub bias: &'a mut Array1<f64>,
    pub grad_weights: &'a Array2<f64>,
    pub grad_bias: &'a Array1<f64>,
    pub bias_enabled: bool,
    pub state: &'a mut OptimizerState,
}
