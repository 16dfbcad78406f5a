use nn_sim::{
    train, ActivationFunction, Dataset, LossType, Network, OptimizerSettings, TrainingSession,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> nn_sim::Result<()> {
    let dataset = Dataset::from_rows(
        &[vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 1.0], vec![0.0, 0.0]],
        &[vec![1.0], vec![0.0], vec![1.0], vec![0.0]],
    )?;

    let mut rng = StdRng::seed_from_u64(42);
    let mut network = Network::new(
        2,
        [(3, true, ActivationFunction::Sigmoid), (1, true, ActivationFunction::Sigmoid)],
        &mut rng,
    )?;

    let session = TrainingSession::new(0.5, 10000)
        .mini_batch(2)
        .with_optimizer(OptimizerSettings::momentum(0.9))
        .with_seed(42);
    let report = train(&mut network, &dataset, &session, &LossType::Sse)?;

    for (epoch, loss) in report.loss_history.iter().enumerate().step_by(1000) {
        println!("Epoch {epoch}: loss = {loss:.6}");
    }

    let outputs = network.predict(dataset.inputs())?;
    for (input, output) in dataset.inputs().rows().into_iter().zip(outputs.rows()) {
        println!("Input: {input} -> Output: {:.4}", output[0]);
    }
    Ok(())
}
