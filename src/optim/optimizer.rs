use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::network::Network;
use crate::optim::adam::{Adam, DEFAULT_BETA1, DEFAULT_BETA2, DEFAULT_EPSILON};
use crate::optim::momentum::Momentum;
use crate::optim::sgd::Sgd;

pub const DEFAULT_MOMENTUM: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerKind {
    Sgd,
    Momentum,
    Adam,
}

impl OptimizerKind {
    pub fn name(&self) -> &'static str {
        match self {
            OptimizerKind::Sgd => "SGD",
            OptimizerKind::Momentum => "SGD with Momentum",
            OptimizerKind::Adam => "ADAM",
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptimizerKind {
    type Err = NnError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sgd" => Ok(OptimizerKind::Sgd),
            "sgd with momentum" | "momentum" => Ok(OptimizerKind::Momentum),
            "adam" => Ok(OptimizerKind::Adam),
            _ => Err(NnError::config(format!("unknown optimizer '{s}'"))),
        }
    }
}

/// Optimizer name plus every hyperparameter any of the variants may need.
///
/// Only the fields relevant to `name` are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    pub name: String,
    pub momentum: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        OptimizerSettings {
            name: OptimizerKind::Sgd.name().to_string(),
            momentum: DEFAULT_MOMENTUM,
            beta1: DEFAULT_BETA1,
            beta2: DEFAULT_BETA2,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl OptimizerSettings {
    pub fn sgd() -> Self {
        OptimizerSettings::default()
    }

    pub fn momentum(momentum: f64) -> Self {
        OptimizerSettings {
            name: OptimizerKind::Momentum.name().to_string(),
            momentum,
            ..OptimizerSettings::default()
        }
    }

    pub fn adam(beta1: f64, beta2: f64, epsilon: f64) -> Self {
        OptimizerSettings {
            name: OptimizerKind::Adam.name().to_string(),
            beta1,
            beta2,
            epsilon,
            ..OptimizerSettings::default()
        }
    }

    pub fn kind(&self) -> Result<OptimizerKind> {
        self.name.parse()
    }
}

/// The update rule, picked once when a session is set up.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateRule {
    Sgd(Sgd),
    Momentum(Momentum),
    Adam(Adam),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No per-layer state allocated yet.
    Uninitialized,
    Ready,
}

/// Applies accumulated layer gradients to a network's parameters.
///
/// One instance is tied to one network for the duration of a training run;
/// the auxiliary tensors it needs live on that network's layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimizer {
    rule: UpdateRule,
    phase: Phase,
}

impl Optimizer {
    pub fn new(rule: UpdateRule) -> Optimizer {
        Optimizer { rule, phase: Phase::Uninitialized }
    }

    /// Resolves the optimizer name and validates its hyperparameters.
    pub fn from_settings(learning_rate: f64, settings: &OptimizerSettings) -> Result<Optimizer> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(NnError::config(format!(
                "learning rate must be a positive number, got {learning_rate}"
            )));
        }
        let rule = match settings.kind()? {
            OptimizerKind::Sgd => UpdateRule::Sgd(Sgd::new(learning_rate)),
            OptimizerKind::Momentum => {
                check_unit_interval("momentum", settings.momentum)?;
                UpdateRule::Momentum(Momentum::new(learning_rate, settings.momentum))
            }
            OptimizerKind::Adam => {
                check_unit_interval("beta1", settings.beta1)?;
                check_unit_interval("beta2", settings.beta2)?;
                if !(settings.epsilon.is_finite() && settings.epsilon > 0.0) {
                    return Err(NnError::config(format!(
                        "epsilon must be greater than zero, got {}",
                        settings.epsilon
                    )));
                }
                UpdateRule::Adam(Adam::with_params(
                    learning_rate,
                    settings.beta1,
                    settings.beta2,
                    settings.epsilon,
                ))
            }
        };
        Ok(Optimizer::new(rule))
    }

    pub fn kind(&self) -> OptimizerKind {
        match self.rule {
            UpdateRule::Sgd(_) => OptimizerKind::Sgd,
            UpdateRule::Momentum(_) => OptimizerKind::Momentum,
            UpdateRule::Adam(_) => OptimizerKind::Adam,
        }
    }

    pub fn rule(&self) -> &UpdateRule {
        &self.rule
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Adam's step counter; `None` for the other rules.
    pub fn timestep(&self) -> Option<u64> {
        match &self.rule {
            UpdateRule::Adam(adam) => Some(adam.timestep()),
            _ => None,
        }
    }

    /// Allocates zeroed auxiliary tensors on every layer that needs them.
    ///
    /// State left on the layers by a previous optimizer is overwritten, so
    /// every run starts from zero velocity or zero moments.
    pub fn prepare(&mut self, network: &mut Network) {
        for layer in network.layers_mut() {
            let dim = layer.weights().dim();
            match &self.rule {
                UpdateRule::Sgd(_) => {}
                UpdateRule::Momentum(rule) => rule.prepare(&mut layer.optim_state, dim),
                UpdateRule::Adam(rule) => rule.prepare(&mut layer.optim_state, dim),
            }
        }
        self.phase = Phase::Ready;
    }

    /// One parameter update from the gradients currently held by the layers.
    pub fn step(&mut self, network: &mut Network) {
        if self.phase == Phase::Uninitialized {
            self.prepare(network);
        }
        if let UpdateRule::Adam(adam) = &mut self.rule {
            adam.advance();
        }
        for layer in network.layers_mut() {
            let params = layer.params_mut();
            match &self.rule {
                UpdateRule::Sgd(rule) => rule.update(params),
                UpdateRule::Momentum(rule) => rule.update(params),
                UpdateRule::Adam(rule) => rule.update(params),
            }
        }
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(NnError::config(format!("{name} must lie in [0, 1), got {value}")))
    }
}
