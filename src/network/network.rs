use std::fmt;

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::layers::dense::Layer;
use crate::loss::LossFunction;
use crate::network::spec::LayerSpec;

/// An ordered stack of dense layers.
///
/// Layer order is fixed at construction: `forward` walks it front to back,
/// `backward` back to front.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
}

/// Read-only copy of one layer's state, taken between training steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub activation: String,
    pub bias_enabled: bool,
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
    pub last_input: Option<Array2<f64>>,
    pub last_output: Option<Array2<f64>>,
}

impl Network {
    /// Builds a network from an input dimension and (neurons, bias, activation)
    /// layer descriptions in input → output order.
    pub fn new<I, R>(n_inputs: usize, layer_specs: I, rng: &mut R) -> Result<Network>
    where
        I: IntoIterator,
        I::Item: Into<LayerSpec>,
        R: Rng + ?Sized,
    {
        let mut fan_in = n_inputs;
        let mut layers = Vec::new();
        for spec in layer_specs {
            let spec = spec.into();
            layers.push(Layer::new(fan_in, spec.neurons, spec.bias, spec.activation, spec.init, rng)?);
            fan_in = spec.neurons;
        }
        Network::from_layers(layers)
    }

    /// Wraps already-built layers, checking that consecutive sizes chain.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Network> {
        if layers.is_empty() {
            return Err(NnError::config("a network needs at least one layer"));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            let (out, next_in) = (pair[0].n_outputs(), pair[1].n_inputs());
            if out != next_in {
                return Err(NnError::config(format!(
                    "layer {i} produces {out} outputs but layer {} expects {next_in} inputs",
                    i + 1
                )));
            }
        }
        Ok(Network { layers })
    }

    /// Forward pass; every layer caches its input and output for backprop.
    pub fn forward(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut current = x.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    /// Same as `forward`; reads better at inference call sites.
    pub fn predict(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.forward(x)
    }

    /// Back-propagates `loss.derivative(y_pred, y_true)` through every layer,
    /// adding to the per-layer gradient accumulators.
    pub fn backward(
        &mut self,
        y_pred: &Array2<f64>,
        y_true: &Array2<f64>,
        loss: &dyn LossFunction,
    ) -> Result<()> {
        let mut delta = loss.derivative(y_pred, y_true)?;
        for layer in self.layers.iter_mut().rev() {
            delta = layer.backward(&delta)?;
        }
        Ok(())
    }

    pub fn zero_gradients(&mut self) {
        self.layers.iter_mut().for_each(Layer::zero_gradients);
    }

    pub fn scale_gradients(&mut self, factor: f64) {
        for layer in &mut self.layers {
            layer.scale_gradients(factor);
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn n_inputs(&self) -> usize {
        self.layers.first().map_or(0, Layer::n_inputs)
    }

    pub fn n_outputs(&self) -> usize {
        self.layers.last().map_or(0, Layer::n_outputs)
    }

    /// Copies of every layer's (weights, bias).
    pub fn parameters(&self) -> Vec<(Array2<f64>, Array1<f64>)> {
        self.layers
            .iter()
            .map(|l| (l.weights().clone(), l.bias().clone()))
            .collect()
    }

    pub fn snapshot(&self) -> Vec<LayerSnapshot> {
        self.layers
            .iter()
            .map(|l| LayerSnapshot {
                activation: l.activation().name().to_string(),
                bias_enabled: l.bias_enabled(),
                weights: l.weights().clone(),
                bias: l.bias().clone(),
                last_input: l.last_input().cloned(),
                last_output: l.last_output().cloned(),
            })
            .collect()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Network(")?;
        for (idx, layer) in self.layers.iter().enumerate() {
            writeln!(
                f,
                "\tLayer [{idx}] Inputs: {}, Outputs: {}, Activation: {}",
                layer.n_inputs(),
                layer.n_outputs(),
                layer.activation()
            )?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction::{Identity, Sigmoid};
    use crate::loss::SseLoss;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn xor_inputs() -> Array2<f64> {
        array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]
    }

    #[test]
    fn sigmoid_network_outputs_probabilities() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut net = Network::new(2, [(2, true, Sigmoid), (1, true, Sigmoid)], &mut rng).unwrap();
        let out = net.forward(&xor_inputs()).unwrap();
        assert_eq!(out.dim(), (4, 1));
        assert!(out.iter().all(|&p| p > 0.0 && p < 1.0));
    }

    #[test]
    fn mismatched_chain_is_rejected_at_build_time() {
        let mut rng = StdRng::seed_from_u64(0);
        let first = Layer::new(2, 3, true, Sigmoid, Default::default(), &mut rng).unwrap();
        let second = Layer::new(4, 1, true, Sigmoid, Default::default(), &mut rng).unwrap();
        let err = Network::from_layers(vec![first, second]).unwrap_err();
        assert!(matches!(err, NnError::Configuration(_)));
    }

    #[test]
    fn empty_network_is_rejected() {
        assert!(matches!(Network::from_layers(vec![]), Err(NnError::Configuration(_))));
    }

    #[test]
    fn forward_rejects_wrong_input_width() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut net = Network::new(3, [(2, true, Sigmoid)], &mut rng).unwrap();
        assert!(matches!(net.forward(&xor_inputs()), Err(NnError::Dimension { .. })));
    }

    #[test]
    fn backward_matches_hand_computed_gradients() {
        // Two identity layers: y = (x·W1)·W2, no bias.
        let l1 = Layer::from_parts(array![[2.0]], None, Identity).unwrap();
        let l2 = Layer::from_parts(array![[3.0]], None, Identity).unwrap();
        let mut net = Network::from_layers(vec![l1, l2]).unwrap();
        let x = array![[1.0]];
        let y = array![[1.0]];
        let pred = net.forward(&x).unwrap();
        assert_eq!(pred, array![[6.0]]);
        net.backward(&pred, &y, &SseLoss).unwrap();
        // dL/dy = 5; dL/dW2 = x·W1·5 = 10; dL/dW1 = x·5·W2 = 15
        assert_relative_eq!(net.layers()[1].grad_weights()[[0, 0]], 10.0);
        assert_relative_eq!(net.layers()[0].grad_weights()[[0, 0]], 15.0);

        net.zero_gradients();
        assert_eq!(net.layers()[0].grad_weights()[[0, 0]], 0.0);
    }

    #[test]
    fn introspection_copies_layer_state() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut net = Network::new(2, [(3, true, Sigmoid), (1, false, Identity)], &mut rng).unwrap();
        net.forward(&xor_inputs()).unwrap();
        let snap = net.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].activation, "Sigmoid");
        assert_eq!(snap[1].last_output.as_ref().map(|o| o.dim()), Some((4, 1)));
        assert!(!snap[1].bias_enabled);
        assert_eq!(net.parameters()[0].0, snap[0].weights);
    }

    #[test]
    fn display_lists_layers() {
        let mut rng = StdRng::seed_from_u64(5);
        let net = Network::new(2, [(3, true, Sigmoid), (1, true, Identity)], &mut rng).unwrap();
        let text = net.to_string();
        assert!(text.contains("Layer [0] Inputs: 2, Outputs: 3, Activation: Sigmoid"));
        assert!(text.contains("Layer [1] Inputs: 3, Outputs: 1, Activation: Identity"));
    }
}
