use ndarray::{Array1, Array2};

/// Auxiliary optimizer tensors owned by one layer.
///
/// Allocated lazily, the first time an optimizer prepares the layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OptimizerState {
    #[default]
    Uninitialized,
    /// SGD with momentum.
    Velocity {
        weights: Array2<f64>,
        bias: Array1<f64>,
    },
    /// Adam first (`m`) and second (`v`) moment estimates.
    Moments {
        m_weights: Array2<f64>,
        v_weights: Array2<f64>,
        m_bias: Array1<f64>,
        v_bias: Array1<f64>,
    },
}

impl OptimizerState {
    pub fn velocity(dim: (usize, usize)) -> Self {
        OptimizerState::Velocity {
            weights: Array2::zeros(dim),
            bias: Array1::zeros(dim.1),
        }
    }

    pub fn moments(dim: (usize, usize)) -> Self {
        OptimizerState::Moments {
            m_weights: Array2::zeros(dim),
            v_weights: Array2::zeros(dim),
            m_bias: Array1::zeros(dim.1),
            v_bias: Array1::zeros(dim.1),
        }
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self, OptimizerState::Uninitialized)
    }
}
