use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::optim::{Optimizer, OptimizerSettings};
use crate::train::epoch_stats::EpochStats;

/// How the dataset is split within one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BatchMode {
    /// One forward/backward pass over every sample.
    #[default]
    Full,
    /// Gradients summed over batches of `batch_size` rows, then divided by
    /// the number of batches.
    MiniBatch { batch_size: usize },
}

/// Requests a per-epoch copy of every layer's |gradient|.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GradientCapture {
    /// Append |grad_bias| as an extra row beneath |grad_weights|.
    #[serde(default)]
    pub stack_bias: bool,
}

/// Configuration for one `train` run.
///
/// # Fields
/// - `learning_rate`     — step size shared by every optimizer
/// - `epochs`            — number of optimizer updates (one per epoch)
/// - `batch_mode`        — full batch or mini-batches
/// - `optimizer`         — optimizer name and hyperparameters
/// - `shuffle`           — permute rows before batching each epoch
/// - `seed`              — seeds batch shuffling; `None` draws from entropy
/// - `capture_gradients` — record |gradients| per epoch when set
/// - `progress_tx`       — optional channel sender; one `EpochStats` is sent per
///                         completed epoch. If the receiver is dropped the loop
///                         terminates early.
/// - `stop_flag`         — optional atomic flag; when set to `true` from another
///                         thread the loop terminates after the current epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSession {
    pub learning_rate: f64,
    pub epochs: usize,
    #[serde(default)]
    pub batch_mode: BatchMode,
    #[serde(default)]
    pub optimizer: OptimizerSettings,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub capture_gradients: Option<GradientCapture>,
    #[serde(skip)]
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    #[serde(skip)]
    pub stop_flag: Option<Arc<AtomicBool>>,
}

fn default_shuffle() -> bool {
    true
}

impl TrainingSession {
    /// Full-batch SGD with no progress channel and no stop flag.
    pub fn new(learning_rate: f64, epochs: usize) -> Self {
        TrainingSession {
            learning_rate,
            epochs,
            batch_mode: BatchMode::Full,
            optimizer: OptimizerSettings::sgd(),
            shuffle: default_shuffle(),
            seed: None,
            capture_gradients: None,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerSettings) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_batch_mode(mut self, batch_mode: BatchMode) -> Self {
        self.batch_mode = batch_mode;
        self
    }

    pub fn mini_batch(self, batch_size: usize) -> Self {
        self.with_batch_mode(BatchMode::MiniBatch { batch_size })
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn capture_gradients(mut self, stack_bias: bool) -> Self {
        self.capture_gradients = Some(GradientCapture { stack_bias });
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    /// Rejects settings no run could use. Optimizer hyperparameters are
    /// checked when the optimizer itself is built.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(NnError::config(format!(
                "learning rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        if self.epochs == 0 {
            return Err(NnError::config("epochs must be at least 1"));
        }
        if let BatchMode::MiniBatch { batch_size: 0 } = self.batch_mode {
            return Err(NnError::config("mini-batch size must be at least 1"));
        }
        Optimizer::from_settings(self.learning_rate, &self.optimizer)?;
        Ok(())
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Serializes the session to a pretty-printed JSON file. Runtime hooks
    /// (`progress_tx`, `stop_flag`) are not stored.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a session written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<TrainingSession> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let session: TrainingSession = serde_json::from_reader(reader)?;
        session.validate()?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_defaults_fill_optional_fields() {
        let session: TrainingSession =
            serde_json::from_str(r#"{ "learning_rate": 0.5, "epochs": 100 }"#).unwrap();
        assert_eq!(session.batch_mode, BatchMode::Full);
        assert_eq!(session.optimizer, OptimizerSettings::sgd());
        assert!(session.shuffle);
        assert!(session.capture_gradients.is_none());
        session.validate().unwrap();
    }

    #[test]
    fn mini_batch_and_optimizer_parse_from_json() {
        let json = r#"{
            "learning_rate": 0.01,
            "epochs": 10,
            "batch_mode": { "mode": "mini_batch", "batch_size": 16 },
            "optimizer": { "name": "ADAM", "beta1": 0.8 },
            "capture_gradients": { "stack_bias": true }
        }"#;
        let session: TrainingSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.batch_mode, BatchMode::MiniBatch { batch_size: 16 });
        assert_eq!(session.optimizer.beta1, 0.8);
        assert_eq!(session.optimizer.beta2, 0.999);
        assert_eq!(session.capture_gradients, Some(GradientCapture { stack_bias: true }));
    }

    #[test]
    fn invalid_sessions_are_configuration_errors() {
        let bad = [
            TrainingSession::new(0.0, 10),
            TrainingSession::new(0.1, 0),
            TrainingSession::new(0.1, 10).mini_batch(0),
            TrainingSession::new(0.1, 10).with_optimizer(OptimizerSettings {
                name: "Nesterov".to_string(),
                ..Default::default()
            }),
            TrainingSession::new(0.1, 10).with_optimizer(OptimizerSettings::momentum(1.5)),
            TrainingSession::new(0.1, 10).with_optimizer(OptimizerSettings::adam(0.9, 0.999, -1.0)),
            TrainingSession::new(0.1, 10).with_optimizer(OptimizerSettings::adam(0.9, 1.0, 1e-7)),
        ];
        for session in bad {
            assert!(matches!(session.validate(), Err(NnError::Configuration(_))));
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let session = TrainingSession::new(0.05, 20)
            .mini_batch(4)
            .with_optimizer(OptimizerSettings::momentum(0.8))
            .with_seed(9);
        let path =
            std::env::temp_dir().join(format!("nn_sim_session_{}.json", std::process::id()));
        session.save_json(&path).unwrap();
        let loaded = TrainingSession::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.batch_mode, session.batch_mode);
        assert_eq!(loaded.optimizer, session.optimizer);
        assert_eq!(loaded.seed, Some(9));
    }

    #[test]
    fn stop_flag_is_observed() {
        let flag = Arc::new(AtomicBool::new(false));
        let session = TrainingSession::new(0.1, 1).with_stop_flag(flag.clone());
        assert!(!session.stop_requested());
        flag.store(true, Ordering::Relaxed);
        assert!(session.stop_requested());
    }
}
