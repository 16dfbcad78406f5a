use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Weight initialisation scheme for a dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// Every weight drawn from N(0, 1).
    #[default]
    StandardNormal,
    /// Xavier (Glorot): N(0, sqrt(1 / fan_in)).
    ///
    /// Recommended before Sigmoid/Identity layers. Keeps the variance of
    /// activations and gradients roughly equal across layers.
    Xavier,
    /// He: N(0, sqrt(2 / fan_in)).
    ///
    /// Recommended before ReLU layers. The variance 2/fan_in accounts for
    /// the fact that ReLU zeroes half of its inputs on average.
    He,
}

impl WeightInit {
    /// Samples a `(fan_in, fan_out)` weight matrix.
    pub fn weights<R: Rng + ?Sized>(&self, fan_in: usize, fan_out: usize, rng: &mut R) -> Array2<f64> {
        Array2::<f64>::random_using((fan_in, fan_out), StandardNormal, rng) * self.std_dev(fan_in)
    }

    /// Samples a bias vector of length `fan_out`.
    pub fn bias<R: Rng + ?Sized>(&self, fan_in: usize, fan_out: usize, rng: &mut R) -> Array1<f64> {
        Array1::<f64>::random_using(fan_out, StandardNormal, rng) * self.std_dev(fan_in)
    }

    fn std_dev(&self, fan_in: usize) -> f64 {
        let fan_in = fan_in.max(1) as f64;
        match self {
            WeightInit::StandardNormal => 1.0,
            WeightInit::Xavier => (1.0 / fan_in).sqrt(),
            WeightInit::He => (2.0 / fan_in).sqrt(),
        }
    }
}
