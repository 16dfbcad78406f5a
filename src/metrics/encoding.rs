use ndarray::Array2;

use crate::error::{NnError, Result};

/// One-hot encodes class indices into an `(labels.len(), n_classes)` array.
pub fn one_hot(labels: &[usize], n_classes: usize) -> Result<Array2<f64>> {
    let mut encoded = Array2::zeros((labels.len(), n_classes));
    for (row, &label) in labels.iter().enumerate() {
        if label >= n_classes {
            return Err(NnError::config(format!(
                "label {label} out of range for {n_classes} classes"
            )));
        }
        encoded[[row, label]] = 1.0;
    }
    Ok(encoded)
}
