use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::ActivationFunction;
use crate::error::Result;
use crate::loss::LossType;
use crate::math::init::WeightInit;
use crate::network::network::Network;

/// Describes one layer in a network specification.
///
/// Fields:
/// - `neurons`    — number of neurons (outputs) in this layer
/// - `bias`       — whether the layer learns a bias vector
/// - `activation` — activation function applied after the linear transform
/// - `init`       — weight initialisation scheme
///
/// The input size is implied by the previous layer, or by the network input
/// dimension for the first layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub neurons: usize,
    #[serde(default = "default_bias")]
    pub bias: bool,
    pub activation: ActivationFunction,
    #[serde(default)]
    pub init: WeightInit,
}

fn default_bias() -> bool {
    true
}

impl LayerSpec {
    pub fn new(neurons: usize, bias: bool, activation: ActivationFunction) -> LayerSpec {
        LayerSpec { neurons, bias, activation, init: WeightInit::default() }
    }

    pub fn with_init(mut self, init: WeightInit) -> LayerSpec {
        self.init = init;
        self
    }
}

impl From<(usize, bool, ActivationFunction)> for LayerSpec {
    fn from((neurons, bias, activation): (usize, bool, ActivationFunction)) -> Self {
        LayerSpec::new(neurons, bias, activation)
    }
}

/// A fully serializable description of a network architecture plus the
/// loss it is trained with.
///
/// `NetworkSpec` can be saved to / loaded from JSON independently of any
/// trained weights, so architectures can be stored before training starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name.
    pub name: String,
    /// Input dimension of the first layer.
    pub n_inputs: usize,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    /// Loss function to pair with this network during training.
    pub loss: LossType,
}

impl NetworkSpec {
    /// Instantiates the described network with freshly sampled weights.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Network> {
        Network::new(self.n_inputs, self.layers.iter().cloned(), rng)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
