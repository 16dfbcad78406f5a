pub mod activation;

pub use activation::{softmax_jacobian, ActivationFunction};
