use ndarray::{Array2, Axis};

use crate::data::loader::DataLoader;
use crate::error::{NnError, Result};
use crate::network::Network;

/// Input samples `X` (N×m) paired with targets `Y` (N×c), one sample per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    inputs: Array2<f64>,
    targets: Array2<f64>,
}

impl Dataset {
    pub fn new(inputs: Array2<f64>, targets: Array2<f64>) -> Result<Dataset> {
        NnError::check_dim(
            "dataset targets",
            (inputs.nrows(), targets.ncols()),
            targets.dim(),
        )?;
        if inputs.nrows() == 0 {
            return Err(NnError::config("dataset must contain at least one sample"));
        }
        Ok(Dataset { inputs, targets })
    }

    /// Builds a dataset from per-sample rows; every row must have the width
    /// of the first one.
    pub fn from_rows(inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<Dataset> {
        Dataset::new(
            rows_to_array("dataset input row", inputs)?,
            rows_to_array("dataset target row", targets)?,
        )
    }

    pub fn inputs(&self) -> &Array2<f64> {
        &self.inputs
    }

    pub fn targets(&self) -> &Array2<f64> {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_inputs(&self) -> usize {
        self.inputs.ncols()
    }

    pub fn n_outputs(&self) -> usize {
        self.targets.ncols()
    }

    /// The network must consume `m` inputs and emit `c` outputs.
    pub fn check_compatible(&self, network: &Network) -> Result<()> {
        NnError::check_dim(
            "network input size",
            (self.len(), network.n_inputs()),
            self.inputs.dim(),
        )?;
        NnError::check_dim(
            "network output size",
            (self.len(), network.n_outputs()),
            self.targets.dim(),
        )
    }

    /// Rows `indices` of both arrays, in the given order.
    pub fn select(&self, indices: &[usize]) -> (Array2<f64>, Array2<f64>) {
        (
            self.inputs.select(Axis(0), indices),
            self.targets.select(Axis(0), indices),
        )
    }

    pub fn loader(&self, batch_size: usize) -> DataLoader<'_> {
        DataLoader::new(self, batch_size)
    }
}

fn rows_to_array(context: &'static str, rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let width = rows.first().map_or(0, Vec::len);
    let mut flat = Vec::with_capacity(rows.len() * width);
    for row in rows {
        NnError::check_dim(context, (1, width), (1, row.len()))?;
        flat.extend_from_slice(row);
    }
    Array2::from_shape_vec((rows.len(), width), flat)
        .map_err(|_| NnError::Dimension { context, expected: (rows.len(), width), found: (0, 0) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction::Sigmoid;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn row_counts_must_agree() {
        let err = Dataset::new(array![[0.0, 1.0], [1.0, 0.0]], array![[1.0]]).unwrap_err();
        assert!(matches!(err, NnError::Dimension { .. }));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let inputs = vec![vec![0.0, 1.0], vec![1.0]];
        let targets = vec![vec![1.0], vec![0.0]];
        assert!(matches!(
            Dataset::from_rows(&inputs, &targets),
            Err(NnError::Dimension { .. })
        ));
    }

    #[test]
    fn compatibility_checks_both_ends() {
        let data = Dataset::from_rows(&[vec![0.0, 1.0]], &[vec![1.0]]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let good = Network::new(2, [(4, true, Sigmoid), (1, true, Sigmoid)], &mut rng).unwrap();
        let wrong_in = Network::new(3, [(1, true, Sigmoid)], &mut rng).unwrap();
        let wrong_out = Network::new(2, [(2, true, Sigmoid)], &mut rng).unwrap();
        assert!(data.check_compatible(&good).is_ok());
        assert!(data.check_compatible(&wrong_in).is_err());
        assert!(data.check_compatible(&wrong_out).is_err());
    }
}
