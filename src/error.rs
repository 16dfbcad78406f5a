//! Error types for the training engine.

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, NnError>;

#[derive(Error, Debug)]
pub enum NnError {
    /// Invalid optimizer/activation/loss name, bad hyperparameter or a layer
    /// chain whose dimensions do not line up.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Array shapes that cannot be combined at runtime.
    #[error("dimension mismatch in {context}: expected {expected:?}, found {found:?}")]
    Dimension {
        context: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// `backward` was called on a layer that holds no cached forward pass.
    #[error("backward called before forward")]
    MissingForward,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NnError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        NnError::Configuration(msg.into())
    }

    /// Returns `Ok(())` when `found == expected`, otherwise a `Dimension` error.
    pub(crate) fn check_dim(
        context: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    ) -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(NnError::Dimension { context, expected, found })
        }
    }
}
