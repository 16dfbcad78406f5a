use ndarray::{Array2, ArrayView1, Axis, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};

/// Binary classification scores. Any ratio whose denominator is zero is 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Rounds predictions and targets to 0/1 and scores them elementwise.
pub fn classification_metrics(
    predicted: &Array2<f64>,
    expected: &Array2<f64>,
) -> Result<ClassificationMetrics> {
    NnError::check_dim("classification metrics", expected.dim(), predicted.dim())?;

    let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);
    Zip::from(predicted).and(expected).for_each(|&p, &y| {
        match (p.round() as i64 == 1, y.round() as i64 == 1) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fn_ += 1,
        }
    });

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1_score = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    Ok(ClassificationMetrics {
        accuracy: ratio(tp + tn, tp + fp + tn + fn_),
        precision,
        recall,
        f1_score,
    })
}

/// Confusion matrix over k-hot columns: entry `(i, j)` counts rows where
/// class `i` is set in `expected` and class `j` is set in `predicted`.
pub fn confusion_matrix(
    predicted: &Array2<f64>,
    expected: &Array2<f64>,
    threshold: f64,
) -> Result<Array2<usize>> {
    NnError::check_dim("confusion matrix", expected.dim(), predicted.dim())?;
    let n_classes = expected.ncols();
    let mut cm = Array2::zeros((n_classes, n_classes));
    for (p_row, y_row) in predicted.axis_iter(Axis(0)).zip(expected.axis_iter(Axis(0))) {
        for (i, _) in y_row.iter().enumerate().filter(|&(_, &y)| y > threshold) {
            for (j, _) in p_row.iter().enumerate().filter(|&(_, &p)| p > threshold) {
                cm[[i, j]] += 1;
            }
        }
    }
    Ok(cm)
}

/// Fraction of rows whose predicted argmax equals the target argmax.
pub fn accuracy(predicted: &Array2<f64>, expected: &Array2<f64>) -> Result<f64> {
    NnError::check_dim("accuracy", expected.dim(), predicted.dim())?;
    let n = predicted.nrows();
    if n == 0 {
        return Ok(0.0);
    }
    let correct = predicted
        .axis_iter(Axis(0))
        .zip(expected.axis_iter(Axis(0)))
        .filter(|(p, y)| argmax(*p) == argmax(*y))
        .count();
    Ok(correct as f64 / n as f64)
}

/// Index of the maximum element in a row.
fn argmax(v: ArrayView1<f64>) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn binary_scores() {
        let predicted = array![[0.9], [0.2], [0.8], [0.4], [0.7]];
        let expected = array![[1.0], [0.0], [0.0], [1.0], [1.0]];
        let m = classification_metrics(&predicted, &expected).unwrap();
        // tp = 2, fp = 1, tn = 1, fn = 1
        assert_relative_eq!(m.accuracy, 0.6, epsilon = 1e-12);
        assert_relative_eq!(m.precision, 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m.recall, 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m.f1_score, 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn no_positive_predictions_give_zero_scores() {
        let m = classification_metrics(&array![[0.1], [0.2]], &array![[1.0], [0.0]]).unwrap();
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1_score, 0.0);
        assert_relative_eq!(m.accuracy, 0.5);
    }

    #[test]
    fn confusion_matrix_counts_k_hot_pairs() {
        let expected = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]];
        let predicted = array![[0.9, 0.1, 0.0], [0.2, 0.7, 0.1], [0.6, 0.1, 0.3], [0.8, 0.6, 0.0]];
        let cm = confusion_matrix(&predicted, &expected, 0.5).unwrap();
        assert_eq!(cm, array![[2, 1, 0], [0, 1, 0], [1, 0, 0]]);
    }

    #[test]
    fn confusion_matrix_rejects_shape_mismatch() {
        let err = confusion_matrix(&array![[1.0, 0.0]], &array![[1.0]], 0.5).unwrap_err();
        assert!(matches!(err, NnError::Dimension { .. }));
    }

    #[test]
    fn argmax_accuracy() {
        let predicted = array![[0.1, 0.9], [0.8, 0.2], [0.4, 0.6]];
        let expected = array![[0.0, 1.0], [0.0, 1.0], [0.0, 1.0]];
        assert_relative_eq!(accuracy(&predicted, &expected).unwrap(), 2.0 / 3.0);
    }
}
