use serde::{Deserialize, Serialize};

/// Per-epoch training statistics emitted by `train`.
///
/// When a `progress_tx` channel is configured on the `TrainingSession`, the
/// training loop sends one `EpochStats` value at the end of every completed
/// epoch. Receivers (e.g. a plotting front-end) use this to drive live loss
/// charts and progress indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Training loss recorded for this epoch.
    pub train_loss: f64,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
