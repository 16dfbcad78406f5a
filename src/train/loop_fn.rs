use std::time::Instant;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::data::Dataset;
use crate::error::Result;
use crate::loss::LossFunction;
use crate::network::Network;
use crate::optim::Optimizer;
use crate::train::epoch_stats::EpochStats;
use crate::train::session::{BatchMode, GradientCapture, TrainingSession};

/// |gradient| per layer, per epoch: `log[epoch][layer]`.
pub type GradientLog = Vec<Vec<Array2<f64>>>;

/// Everything a finished (or stopped) run hands back to the caller.
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    /// One entry per completed epoch.
    pub loss_history: Vec<f64>,
    /// Present only when the session asked for gradient capture.
    pub gradient_log: Option<GradientLog>,
    pub stats: Vec<EpochStats>,
}

impl TrainingReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.loss_history.last().copied()
    }

    pub fn epochs_completed(&self) -> usize {
        self.loss_history.len()
    }
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Trains `network` on `dataset` as configured by `session`.
///
/// Every epoch zeroes the layer gradients, runs the configured batch
/// structure, then applies exactly one optimizer update.
///
/// # Errors
/// - `Configuration` for an invalid session or unknown optimizer, before any
///   epoch runs.
/// - `Dimension` if the dataset does not fit the network's input/output sizes.
///
/// # Early termination
/// The loop breaks after the current epoch if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `session.stop_flag` is set to `true`.
pub fn train(
    network: &mut Network,
    dataset: &Dataset,
    session: &TrainingSession,
    loss: &dyn LossFunction,
) -> Result<TrainingReport> {
    session.validate()?;
    dataset.check_compatible(network)?;
    let mut optimizer = Optimizer::from_settings(session.learning_rate, &session.optimizer)?;
    optimizer.prepare(network);

    let mut rng = match session.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        optimizer = %optimizer.kind(),
        batch_mode = ?session.batch_mode,
        epochs = session.epochs,
        learning_rate = session.learning_rate,
        loss = loss.name(),
        "training started"
    );

    let mut report = TrainingReport {
        gradient_log: session.capture_gradients.map(|_| Vec::new()),
        ..TrainingReport::default()
    };

    for epoch in 1..=session.epochs {
        if session.stop_requested() {
            warn!(epoch, "stop flag set, ending training early");
            break;
        }

        let t_start = Instant::now();

        network.zero_gradients();
        let (train_loss, grads) = match session.batch_mode {
            BatchMode::Full => run_full_batch(network, dataset, loss, session.capture_gradients)?,
            BatchMode::MiniBatch { batch_size } => run_mini_batch(
                network,
                dataset,
                loss,
                batch_size,
                session.shuffle,
                &mut rng,
                session.capture_gradients,
            )?,
        };
        optimizer.step(network);

        report.loss_history.push(train_loss);
        if let (Some(log), Some(grads)) = (report.gradient_log.as_mut(), grads) {
            log.push(grads);
        }

        let stats = EpochStats {
            epoch,
            total_epochs: session.epochs,
            train_loss,
            elapsed_ms: u64::try_from(t_start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        debug!(epoch, train_loss, "epoch finished");
        report.stats.push(stats.clone());

        if let Some(ref tx) = session.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                warn!(epoch, "progress receiver dropped, ending training early");
                break;
            }
        }
    }

    if let Some(final_loss) = report.final_loss() {
        info!(final_loss, epochs = report.epochs_completed(), "training finished");
    }
    Ok(report)
}

/// Loss of one forward pass over the whole dataset. Gradients are untouched,
/// but every layer's cached input/output is overwritten.
pub fn evaluate(network: &mut Network, dataset: &Dataset, loss: &dyn LossFunction) -> Result<f64> {
    dataset.check_compatible(network)?;
    let y_pred = network.forward(dataset.inputs())?;
    loss.forward(&y_pred, dataset.targets())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

type EpochOutcome = (f64, Option<Vec<Array2<f64>>>);

/// One forward/backward over every sample. Returns that pass's loss.
fn run_full_batch(
    network: &mut Network,
    dataset: &Dataset,
    loss: &dyn LossFunction,
    capture: Option<GradientCapture>,
) -> Result<EpochOutcome> {
    let y_pred = network.forward(dataset.inputs())?;
    let train_loss = loss.forward(&y_pred, dataset.targets())?;
    network.backward(&y_pred, dataset.targets(), loss)?;
    Ok((train_loss, capture.map(|c| gradient_magnitudes(network, c))))
}

/// Sums gradients over every batch, then divides them by the number of
/// batches (not samples). Returns the batch-averaged loss.
fn run_mini_batch(
    network: &mut Network,
    dataset: &Dataset,
    loss: &dyn LossFunction,
    batch_size: usize,
    shuffle: bool,
    rng: &mut StdRng,
    capture: Option<GradientCapture>,
) -> Result<EpochOutcome> {
    let mut total_loss = 0.0;
    let mut n_batches = 0usize;

    for (x, y) in dataset.loader(batch_size).iter(shuffle, rng) {
        let y_pred = network.forward(&x)?;
        total_loss += loss.forward(&y_pred, &y)?;
        network.backward(&y_pred, &y, loss)?;
        n_batches += 1;
    }

    // Captured before averaging.
    let grads = capture.map(|c| gradient_magnitudes(network, c));

    let n = n_batches.max(1) as f64;
    network.scale_gradients(1.0 / n);
    Ok((total_loss / n, grads))
}

fn gradient_magnitudes(network: &Network, capture: GradientCapture) -> Vec<Array2<f64>> {
    network
        .layers()
        .iter()
        .map(|layer| layer.gradient_magnitudes(capture.stack_bias))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction::{Identity, Sigmoid};
    use crate::loss::{MseLoss, SseLoss};
    use crate::optim::{OptimizerSettings, OptimizerState};
    use approx::assert_relative_eq;
    use ndarray::array;
    use std::sync::atomic::AtomicBool;
    use std::sync::{mpsc, Arc};

    fn xor() -> Dataset {
        Dataset::new(
            array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]],
            array![[0.0], [1.0], [1.0], [0.0]],
        )
        .unwrap()
    }

    fn xor_net(seed: u64) -> Network {
        let mut rng = StdRng::seed_from_u64(seed);
        Network::new(2, [(3, true, Sigmoid), (1, true, Sigmoid)], &mut rng).unwrap()
    }

    #[test]
    fn each_run_starts_from_fresh_optimizer_state() {
        let data = xor();
        for settings in [OptimizerSettings::momentum(0.9), OptimizerSettings::adam(0.9, 0.999, 1e-7)] {
            let warm_up = TrainingSession::new(0.1, 50).with_optimizer(settings.clone());
            let mut reused = xor_net(6);
            train(&mut reused, &data, &warm_up, &SseLoss).unwrap();
            assert!(reused.layers()[0].optimizer_state().is_initialized());

            let mut fresh = reused.clone();
            for layer in fresh.layers_mut() {
                layer.optim_state = OptimizerState::Uninitialized;
            }

            let second = TrainingSession::new(0.1, 1).with_optimizer(settings);
            train(&mut reused, &data, &second, &SseLoss).unwrap();
            train(&mut fresh, &data, &second, &SseLoss).unwrap();
            assert_eq!(reused.parameters(), fresh.parameters());
            assert_eq!(
                reused.layers()[1].optimizer_state(),
                fresh.layers()[1].optimizer_state()
            );
        }
    }

    #[test]
    fn one_loss_entry_per_epoch() {
        let mut net = xor_net(1);
        let report = train(&mut net, &xor(), &TrainingSession::new(0.5, 25), &SseLoss).unwrap();
        assert_eq!(report.loss_history.len(), 25);
        assert_eq!(report.stats.len(), 25);
        assert_eq!(report.stats[24].epoch, 25);
        assert!(report.gradient_log.is_none());
    }

    #[test]
    fn full_batch_loss_is_loss_before_the_update() {
        let data = xor();
        let mut net = xor_net(2);
        let expected = evaluate(&mut net.clone(), &data, &SseLoss).unwrap();
        let report = train(&mut net, &data, &TrainingSession::new(0.5, 1), &SseLoss).unwrap();
        assert_relative_eq!(report.loss_history[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn mini_batch_divides_by_batch_count() {
        // Single identity weight, no bias, four samples in two batches.
        let data = Dataset::new(
            array![[1.0], [1.0], [1.0], [1.0]],
            array![[0.0], [0.0], [0.0], [0.0]],
        )
        .unwrap();
        let layer = crate::layers::Layer::from_parts(array![[1.0]], None, Identity).unwrap();
        let mut net = Network::from_layers(vec![layer]).unwrap();
        let session = TrainingSession::new(0.1, 1).mini_batch(2).with_shuffle(false);
        let report = train(&mut net, &data, &session, &SseLoss).unwrap();
        // Each batch: SSE = 1.0, grad_w = 2.0. Sum over 2 batches / 2 = 2.0.
        assert_relative_eq!(report.loss_history[0], 1.0);
        assert_relative_eq!(net.layers()[0].weights()[[0, 0]], 1.0 - 0.1 * 2.0);
    }

    #[test]
    fn gradient_capture_records_pre_average_magnitudes() {
        let data = xor();
        let mut net = xor_net(3);
        let session = TrainingSession::new(0.5, 3).mini_batch(2).with_seed(4).capture_gradients(true);
        let report = train(&mut net, &data, &session, &SseLoss).unwrap();
        let log = report.gradient_log.unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].len(), 2);
        // 2×3 weights plus a stacked bias row
        assert_eq!(log[0][0].dim(), (3, 3));
        assert_eq!(log[0][1].dim(), (4, 1));
        assert!(log.iter().flatten().flatten().all(|&g| g >= 0.0));
    }

    #[test]
    fn captured_gradients_are_taken_before_averaging() {
        let data = xor();
        let mut net = xor_net(8);
        let session = TrainingSession::new(0.5, 1).mini_batch(1).with_shuffle(false).capture_gradients(false);
        let mut probe = net.clone();
        let report = train(&mut net, &data, &session, &SseLoss).unwrap();

        // Summed (not averaged) gradients equal one full-batch backward pass.
        probe.zero_gradients();
        let pred = probe.forward(data.inputs()).unwrap();
        probe.backward(&pred, data.targets(), &SseLoss).unwrap();
        let captured = &report.gradient_log.unwrap()[0][1];
        let full = probe.layers()[1].grad_weights().mapv(f64::abs);
        for (a, b) in captured.iter().zip(full.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn progress_channel_receives_every_epoch() {
        let (tx, rx) = mpsc::channel();
        let mut net = xor_net(5);
        let session = TrainingSession::new(0.5, 4).with_progress(tx);
        train(&mut net, &xor(), &session, &MseLoss).unwrap();
        let epochs: Vec<usize> = rx.try_iter().map(|s| s.epoch).collect();
        assert_eq!(epochs, vec![1, 2, 3, 4]);
    }

    #[test]
    fn dropped_receiver_stops_after_first_epoch() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut net = xor_net(5);
        let session = TrainingSession::new(0.5, 10).with_progress(tx);
        let report = train(&mut net, &xor(), &session, &MseLoss).unwrap();
        assert_eq!(report.epochs_completed(), 1);
    }

    #[test]
    fn stop_flag_prevents_any_epoch() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut net = xor_net(6);
        let before = net.parameters();
        let session = TrainingSession::new(0.5, 10).with_stop_flag(flag);
        let report = train(&mut net, &xor(), &session, &SseLoss).unwrap();
        assert_eq!(report.epochs_completed(), 0);
        assert_eq!(net.parameters(), before);
    }

    #[test]
    fn unknown_optimizer_fails_before_training() {
        let mut net = xor_net(7);
        let before = net.parameters();
        let session = TrainingSession::new(0.5, 10).with_optimizer(OptimizerSettings {
            name: "LBFGS".to_string(),
            ..Default::default()
        });
        let err = train(&mut net, &xor(), &session, &SseLoss).unwrap_err();
        assert!(matches!(err, crate::error::NnError::Configuration(_)));
        assert_eq!(net.parameters(), before);
    }

    #[test]
    fn incompatible_dataset_is_a_dimension_error() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut net = Network::new(3, [(1, true, Sigmoid)], &mut rng).unwrap();
        let err = train(&mut net, &xor(), &TrainingSession::new(0.5, 1), &SseLoss).unwrap_err();
        assert!(matches!(err, crate::error::NnError::Dimension { .. }));
    }
}
