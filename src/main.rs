// Trains the XOR demo network and prints its predictions.
//
//   cargo run                      # full-batch Adam defaults
//   cargo run -- session.json      # any TrainingSession saved as JSON
//
// Set RUST_LOG=debug to see per-epoch losses.
use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use nn_sim::{
    train, ActivationFunction, Dataset, LossType, Network, OptimizerSettings, TrainingSession,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let session = match std::env::args().nth(1) {
        Some(path) => TrainingSession::load_json(path)?,
        None => TrainingSession::new(0.05, 2000)
            .with_optimizer(OptimizerSettings::adam(0.9, 0.999, 1e-7))
            .with_seed(7),
    };

    let dataset = Dataset::new(
        array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]],
        array![[0.0], [1.0], [1.0], [0.0]],
    )?;

    let mut rng = match session.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut network = Network::new(
        2,
        [(3, true, ActivationFunction::Sigmoid), (1, true, ActivationFunction::Sigmoid)],
        &mut rng,
    )?;
    println!("{network}");

    let report = train(&mut network, &dataset, &session, &LossType::Sse)?;
    println!("Final loss: {:.6}", report.final_loss().unwrap_or(f64::NAN));

    let predictions = network.predict(dataset.inputs())?;
    for (input, output) in dataset.inputs().rows().into_iter().zip(predictions.rows()) {
        println!("Input: {input} -> Output: {:.4}", output[0]);
    }
    Ok(())
}
